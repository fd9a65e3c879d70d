//! Cross-validated depth search producing a final decision tree.
use crate::data::dataset::{Dataset, Number, WholeNumber};
use crate::data::encoding::{ColumnTransform, Encoder};
use crate::data::folds::{partition, Fold, RemainderPolicy};
use crate::tree::{DecisionTree, TreeOptions};
use rand::{rngs::StdRng, SeedableRng};
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

/// Receives progress lines while a search runs.
pub type ProgressSink = Box<dyn Fn(&str) + Send + Sync>;

/// Settings for [`train`] and [`train_raw`].
pub struct TrainerOptions {
    number_of_folds: usize,
    degree_of_parallelism: usize,
    random_seed: u64,
    max_depth_to_check: Option<u16>,
    remainder_policy: RemainderPolicy,
    progress: Option<ProgressSink>,
    categories_case_sensitive: bool,
    column_transforms: HashMap<usize, ColumnTransform>,
}

impl Default for TrainerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerOptions {
    pub fn new() -> Self {
        Self {
            number_of_folds: 10,
            degree_of_parallelism: 1,
            random_seed: 164562,
            max_depth_to_check: None,
            remainder_policy: RemainderPolicy::AbsorbIntoLast,
            progress: None,
            categories_case_sensitive: false,
            column_transforms: HashMap::new(),
        }
    }

    pub fn set_number_of_folds(&mut self, number_of_folds: usize) -> Result<(), Box<dyn Error>> {
        if number_of_folds == 0 {
            return Err("The number of folds must be greater than 0.".into());
        }
        self.number_of_folds = number_of_folds;
        Ok(())
    }

    /// 0 lets the thread pool pick its own size.
    pub fn set_degree_of_parallelism(&mut self, degree_of_parallelism: usize) {
        self.degree_of_parallelism = degree_of_parallelism;
    }

    pub fn set_random_seed(&mut self, random_seed: u64) {
        self.random_seed = random_seed;
    }

    /// `None` searches every depth up to the feature count.
    pub fn set_max_depth_to_check(
        &mut self,
        max_depth_to_check: Option<u16>,
    ) -> Result<(), Box<dyn Error>> {
        if max_depth_to_check == Some(0) {
            return Err("The maximum depth to check must be greater than 0.".into());
        }
        self.max_depth_to_check = max_depth_to_check;
        Ok(())
    }

    pub fn set_remainder_policy(&mut self, remainder_policy: RemainderPolicy) {
        self.remainder_policy = remainder_policy;
    }

    pub fn set_progress_sink(&mut self, progress: ProgressSink) {
        self.progress = Some(progress);
    }

    pub fn set_categories_case_sensitive(&mut self, case_sensitive: bool) {
        self.categories_case_sensitive = case_sensitive;
    }

    pub fn set_column_transform(&mut self, column: usize, transform: ColumnTransform) {
        self.column_transforms.insert(column, transform);
    }

    pub fn number_of_folds(&self) -> usize {
        self.number_of_folds
    }

    pub fn degree_of_parallelism(&self) -> usize {
        self.degree_of_parallelism
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn max_depth_to_check(&self) -> Option<u16> {
        self.max_depth_to_check
    }

    pub fn remainder_policy(&self) -> RemainderPolicy {
        self.remainder_policy
    }

    pub fn progress_sink(&self) -> Option<&(dyn Fn(&str) + Send + Sync)> {
        self.progress.as_deref()
    }

    pub fn categories_case_sensitive(&self) -> bool {
        self.categories_case_sensitive
    }

    pub fn column_transforms(&self) -> &HashMap<usize, ColumnTransform> {
        &self.column_transforms
    }
}

/// Searches candidate depths with k-fold cross-validation and grows the final
/// tree on the whole dataset at the depth that scored best.
///
/// Every depth's fold set is drawn from one seeded rng before the parallel
/// evaluation starts, and the winning depth is picked by an ascending scan
/// with a strict comparison, so results do not depend on worker scheduling
/// and the smallest depth wins a tied score.
pub fn train<XT: Number, YT: WholeNumber>(
    dataset: &Dataset<XT, YT>,
    options: &TrainerOptions,
) -> Result<DecisionTree<XT, YT>, Box<dyn Error>> {
    if dataset.x.nrows() != dataset.y.len() {
        return Err(format!(
            "The number of classes {} does not match the number of observations {}.",
            dataset.y.len(),
            dataset.x.nrows()
        )
        .into());
    }

    if dataset.nrows() == 0 || dataset.ncols() == 0 {
        return Ok(DecisionTree::empty());
    }

    let max_depth = match options.max_depth_to_check() {
        Some(depth) => depth,
        None => u16::try_from(dataset.ncols()).unwrap_or(u16::MAX),
    };

    let mut rng = StdRng::seed_from_u64(options.random_seed());
    let fold_sets = (1..=max_depth)
        .map(|_| {
            partition(
                dataset,
                options.number_of_folds(),
                options.remainder_policy(),
                &mut rng,
            )
        })
        .collect::<Vec<_>>();

    let progress = options.progress_sink();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.degree_of_parallelism())
        .build()?;

    let scores = pool.install(|| {
        fold_sets
            .par_iter()
            .enumerate()
            .map(|(offset, folds)| evaluate_depth(offset as u16 + 1, folds, progress))
            .collect::<Result<Vec<_>, String>>()
    })?;

    let mut best_depth = 1u16;
    let mut best_score = None;
    for (offset, &score) in scores.iter().enumerate() {
        if best_score.map_or(true, |best| score > best) {
            best_score = Some(score);
            best_depth = offset as u16 + 1;
        }
    }

    log(
        progress,
        &format!(
            "Best depth was {} with accuracy: {}.",
            best_depth,
            best_score.unwrap_or(0.0)
        ),
    );

    let table = scores
        .iter()
        .enumerate()
        .map(|(offset, score)| format!("{}\t{}", offset + 1, score))
        .collect::<Vec<_>>()
        .join("\n");
    log(progress, &format!("Depth\tAccuracy\n{}", table));

    let mut tree_options = TreeOptions::new();
    tree_options.set_max_depth(Some(best_depth));
    DecisionTree::build(dataset, &tree_options)
}

/// Encodes raw string rows and trains on the result. The column holding the
/// class labels is named by `label_column`.
pub fn train_raw<XT: Number, YT: WholeNumber>(
    rows: &[Vec<String>],
    label_column: usize,
    options: &TrainerOptions,
) -> Result<DecisionTree<XT, YT>, Box<dyn Error>> {
    let mut encoder = Encoder::new();
    encoder.set_case_sensitive(options.categories_case_sensitive());
    for (&column, transform) in options.column_transforms() {
        encoder.set_column_transform(column, Arc::clone(transform));
    }

    let dataset = encoder.encode::<XT, YT>(rows, label_column)?;
    train(&dataset, options)
}

/// Mean test accuracy over a depth's folds. Folds with no test rows are
/// skipped; when every fold is skipped the depth scores 0.
fn evaluate_depth<XT: Number, YT: WholeNumber>(
    depth: u16,
    folds: &[Fold<XT, YT>],
    progress: Option<&(dyn Fn(&str) + Send + Sync)>,
) -> Result<f64, String> {
    log(progress, &format!("Beginning training for depth: {}.", depth));

    let mut tree_options = TreeOptions::new();
    tree_options.set_max_depth(Some(depth));

    let mut accuracies = Vec::with_capacity(folds.len());

    for (fold_number, fold) in folds.iter().enumerate() {
        log(
            progress,
            &format!(
                "   D{} - Train fold {} of {}.",
                depth,
                fold_number + 1,
                folds.len()
            ),
        );

        let tree =
            DecisionTree::build(&fold.train, &tree_options).map_err(|error| error.to_string())?;

        let test_rows = fold.test.nrows();
        if test_rows == 0 {
            continue;
        }

        let mut wrong = 0usize;
        for row in 0..test_rows {
            let record = fold.test.x.row(row).iter().copied().collect::<Vec<_>>();
            if tree.predict(&record) != Some(fold.test.y[row]) {
                wrong += 1;
            }
        }

        let accuracy = (test_rows - wrong) as f64 / test_rows as f64;
        log(
            progress,
            &format!("      D{} - Accuracy was: {}.", depth, accuracy),
        );
        accuracies.push(accuracy);
    }

    let score = if accuracies.is_empty() {
        0.0
    } else {
        accuracies.iter().sum::<f64>() / accuracies.len() as f64
    };

    log(
        progress,
        &format!("   D{} - Overall accuracy for depth {} was: {}.", depth, depth, score),
    );

    Ok(score)
}

fn log(progress: Option<&(dyn Fn(&str) + Send + Sync)>, message: &str) {
    if let Some(sink) = progress {
        sink(message);
    }
}
