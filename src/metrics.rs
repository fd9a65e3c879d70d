//! Classification evaluation metrics.
use crate::data::dataset::WholeNumber;
use nalgebra::{DMatrix, DVector};
use std::collections::{HashMap, HashSet};
use std::error::Error;

type ConfusionMatrix = DMatrix<usize>;

/// Evaluation helpers available on any classifier-like type.
pub trait ClassificationMetrics<T: WholeNumber> {
    /// Confusion matrix over the union of observed classes, sorted ascending;
    /// rows are the true classes, columns the predicted ones.
    fn confusion_matrix(
        &self,
        y_true: &DVector<T>,
        y_pred: &DVector<T>,
    ) -> Result<ConfusionMatrix, Box<dyn Error>> {
        if y_true.len() != y_pred.len() {
            return Err("Predictions and labels are of different sizes.".into());
        }
        if y_true.is_empty() {
            return Err("There are no observations to evaluate.".into());
        }

        let mut classes = y_true
            .iter()
            .chain(y_pred.iter())
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let slots = classes
            .iter()
            .enumerate()
            .map(|(slot, &class)| (class, slot))
            .collect::<HashMap<_, _>>();

        let mut matrix = DMatrix::zeros(classes.len(), classes.len());
        for (truth, predicted) in y_true.iter().zip(y_pred.iter()) {
            matrix[(slots[truth], slots[predicted])] += 1;
        }

        Ok(matrix)
    }

    /// Fraction of predictions matching the true label.
    fn accuracy(&self, y_true: &DVector<T>, y_pred: &DVector<T>) -> Result<f64, Box<dyn Error>> {
        let matrix = self.confusion_matrix(y_true, y_pred)?;
        let correct: usize = matrix.diagonal().iter().sum();

        Ok(correct as f64 / y_true.len() as f64)
    }

    /// Per-class precision averaged uniformly over the classes.
    fn macro_precision(
        &self,
        y_true: &DVector<T>,
        y_pred: &DVector<T>,
    ) -> Result<f64, Box<dyn Error>> {
        let matrix = self.confusion_matrix(y_true, y_pred)?;

        let mut total = 0.0;
        for class in 0..matrix.nrows() {
            let true_positives = matrix[(class, class)];
            let predicted = matrix.column(class).sum();
            if predicted > 0 {
                total += true_positives as f64 / predicted as f64;
            }
        }

        Ok(total / matrix.nrows() as f64)
    }

    /// Per-class recall averaged uniformly over the classes.
    fn macro_recall(
        &self,
        y_true: &DVector<T>,
        y_pred: &DVector<T>,
    ) -> Result<f64, Box<dyn Error>> {
        let matrix = self.confusion_matrix(y_true, y_pred)?;

        let mut total = 0.0;
        for class in 0..matrix.nrows() {
            let true_positives = matrix[(class, class)];
            let actual = matrix.row(class).sum();
            if actual > 0 {
                total += true_positives as f64 / actual as f64;
            }
        }

        Ok(total / matrix.nrows() as f64)
    }

    /// Harmonic mean of macro precision and macro recall.
    fn f1_score(&self, y_true: &DVector<T>, y_pred: &DVector<T>) -> Result<f64, Box<dyn Error>> {
        let precision = self.macro_precision(y_true, y_pred)?;
        let recall = self.macro_recall(y_true, y_pred)?;

        if precision + recall < f64::EPSILON {
            return Err("Precision and recall are both 0, F1 score undefined.".into());
        }

        Ok(2.0 * (precision * recall) / (precision + recall))
    }
}
