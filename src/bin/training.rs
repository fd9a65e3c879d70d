use arbor::data::dataset::Dataset;
use arbor::data::encoding::Encoder;
use arbor::metrics::ClassificationMetrics;
use arbor::trainer::{self, TrainerOptions};
use csv::ReaderBuilder;
use std::env;
use std::error::Error;

fn read_rows(file_path: &str, header: bool) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(header)
        .flexible(true)
        .from_path(file_path)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    Ok(rows)
}

fn run(file_path: &str) -> Result<(), Box<dyn Error>> {
    let rows = read_rows(file_path, true)?;
    if rows.is_empty() {
        return Err("The file contained no data rows.".into());
    }

    // The label lives in the last column.
    let label_column = rows[0].len() - 1;

    let encoder = Encoder::new();
    let dataset: Dataset<f64, i32> = encoder.encode(&rows, label_column)?;

    let (train_set, test_set) = dataset.train_test_split(0.75, Some(164562))?;

    let mut options = TrainerOptions::new();
    options.set_number_of_folds(5)?;
    options.set_degree_of_parallelism(0);
    options.set_progress_sink(Box::new(|line| println!("{}", line)));

    let tree = trainer::train(&train_set, &options)?;
    if tree.is_empty() {
        println!("No tree could be induced from {}.", file_path);
        return Ok(());
    }

    let predictions = tree.predict_batch(&test_set.x)?;
    let accuracy = tree.accuracy(&test_set.y, &predictions)?;
    let confusion = tree.confusion_matrix(&test_set.y, &predictions)?;

    println!("Holdout accuracy: {:.3}", accuracy);
    println!("Confusion matrix (rows are truth):{}", confusion);
    Ok(())
}

fn main() {
    let mut args = env::args().skip(1);
    let file_path = match args.next() {
        Some(file_path) => file_path,
        None => {
            eprintln!("Usage: train-tree <csv-file>");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&file_path) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
