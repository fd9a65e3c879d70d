//! Raw-row encoding: textual records to a numeric dataset.
use super::dataset::{Dataset, Number, WholeNumber};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;

/// Assigns the numeric code for a previously unseen category in one column.
pub type ColumnTransform = Arc<dyn Fn(&str) -> i64 + Send + Sync>;

/// Turns rows of raw strings into a numeric feature matrix plus labels.
///
/// Cells that parse as numbers pass through unchanged. Anything else is
/// treated as a category and replaced with a per-column code: dense 0-based
/// by default, or whatever a registered [`ColumnTransform`] returns for that
/// column. Category matching folds case unless configured otherwise.
#[derive(Default)]
pub struct Encoder {
    case_sensitive: bool,
    transforms: HashMap<usize, ColumnTransform>,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            case_sensitive: false,
            transforms: HashMap::new(),
        }
    }

    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
    }

    pub fn set_column_transform(&mut self, column: usize, transform: ColumnTransform) {
        self.transforms.insert(column, transform);
    }

    /// Encodes `rows`, pulling class labels out of `label_column` and packing
    /// the remaining columns, in order, into the feature matrix.
    pub fn encode<XT: Number, YT: WholeNumber>(
        &self,
        rows: &[Vec<String>],
        label_column: usize,
    ) -> Result<Dataset<XT, YT>, Box<dyn Error>> {
        if rows.is_empty() {
            return Ok(Dataset::new(DMatrix::zeros(0, 0), DVector::zeros(0)));
        }

        let width = rows[0].len();
        if label_column >= width {
            return Err(format!(
                "The label column {} is not in the range of columns (0 <= x < {}).",
                label_column, width
            )
            .into());
        }

        let mut categories: HashMap<usize, HashMap<String, i64>> = HashMap::new();

        let mut features = Vec::with_capacity(rows.len() * (width - 1));
        let mut labels = Vec::with_capacity(rows.len());

        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(format!(
                    "Row {} had {} columns where {} were expected.",
                    row_index,
                    row.len(),
                    width
                )
                .into());
            }

            for (column, cell) in row.iter().enumerate() {
                let value = match cell.parse::<f64>() {
                    Ok(numeric) => numeric,
                    Err(_) => self.category_code(&mut categories, column, cell) as f64,
                };

                if column == label_column {
                    let label = YT::from_f64(value)
                        .ok_or_else(|| format!("Label {} is not representable.", value))?;
                    labels.push(label);
                } else {
                    let feature = XT::from_f64(value)
                        .ok_or_else(|| format!("Feature value {} is not representable.", value))?;
                    features.push(feature);
                }
            }
        }

        let x = DMatrix::from_row_slice(rows.len(), width - 1, &features);
        Ok(Dataset::new(x, DVector::from_vec(labels)))
    }

    fn category_code(
        &self,
        categories: &mut HashMap<usize, HashMap<String, i64>>,
        column: usize,
        cell: &str,
    ) -> i64 {
        let key = if self.case_sensitive {
            cell.to_string()
        } else {
            cell.to_lowercase()
        };

        let column_map = categories.entry(column).or_default();

        if let Some(&code) = column_map.get(&key) {
            return code;
        }

        let code = match self.transforms.get(&column) {
            Some(transform) => transform(cell),
            None => column_map.len() as i64,
        };
        column_map.insert(key, code);
        code
    }
}
