//! Best-split search over the active rows of a dataset.
use super::gini::gini_impurity;
use super::node::SplitDecision;
use crate::data::dataset::{Number, WholeNumber};
use nalgebra::{DMatrix, DVector};
use std::collections::HashMap;
use std::error::Error;

/// Dense 0-based indexing over the class labels present in a label vector,
/// in order of first appearance.
pub struct ClassIndex<YT: WholeNumber> {
    indices: HashMap<YT, usize>,
    classes: Vec<YT>,
}

impl<YT: WholeNumber> ClassIndex<YT> {
    pub fn from_labels(y: &DVector<YT>) -> Self {
        let mut indices = HashMap::new();
        let mut classes = Vec::new();

        for &label in y.iter() {
            if !indices.contains_key(&label) {
                indices.insert(label, classes.len());
                classes.push(label);
            }
        }

        Self { indices, classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn index_of(&self, label: YT) -> usize {
        self.indices[&label]
    }

    pub fn class_at(&self, index: usize) -> YT {
        self.classes[index]
    }
}

/// Finds the `(dimension, threshold)` split with the highest impurity gain
/// over the active rows, or `None` when no split improves on the node.
///
/// Dimensions are searched in ascending order and compared with a strict
/// greater-than, so the lowest dimension wins a tied gain. A supplied
/// `feature_mask` excludes the dimensions flagged `false`.
pub fn best_split<XT: Number, YT: WholeNumber>(
    x: &DMatrix<XT>,
    y: &DVector<YT>,
    class_index: &ClassIndex<YT>,
    active: &[bool],
    feature_mask: Option<&[bool]>,
) -> Result<Option<SplitDecision<XT, YT>>, Box<dyn Error>> {
    if x.nrows() != y.len() {
        return Err(format!(
            "Data and class mismatch. Classes: {}, Data: {}.",
            y.len(),
            x.nrows()
        )
        .into());
    }

    if let Some(mask) = feature_mask {
        if mask.len() != x.ncols() {
            return Err(format!(
                "Feature mask length {} does not match the number of dimensions {}.",
                mask.len(),
                x.ncols()
            )
            .into());
        }
    }

    let mut best: Option<SplitDecision<XT, YT>> = None;

    for dimension in 0..x.ncols() {
        if feature_mask.is_some_and(|mask| !mask[dimension]) {
            continue;
        }

        if let Some(found) = split_dimension(x, y, class_index, active, dimension) {
            let improves = match &best {
                Some(current) => found.gain > current.gain,
                None => true,
            };
            if improves {
                best = Some(found);
            }
        }
    }

    Ok(best)
}

/// Exhaustive threshold scan within one dimension. Candidate thresholds are
/// the distinct active values in row order of first appearance; a candidate
/// only replaces the incumbent on a strictly greater gain, so the first seen
/// wins ties and a gain of zero is never selected.
fn split_dimension<XT: Number, YT: WholeNumber>(
    x: &DMatrix<XT>,
    y: &DVector<YT>,
    class_index: &ClassIndex<YT>,
    active: &[bool],
    dimension: usize,
) -> Option<SplitDecision<XT, YT>> {
    let mut counts = vec![0usize; class_index.len()];
    let mut active_total = 0usize;

    for row in 0..x.nrows() {
        if !active[row] {
            continue;
        }
        counts[class_index.index_of(y[row])] += 1;
        active_total += 1;
    }

    let base_impurity = gini_impurity(&counts);
    if base_impurity == 0.0 {
        // Already pure, nothing to gain in this dimension.
        return None;
    }

    let mut best: Option<SplitDecision<XT, YT>> = None;
    let mut best_gain = 0.0_f64;

    let mut left_counts = vec![0usize; class_index.len()];
    let mut right_counts = vec![0usize; class_index.len()];
    let mut visited: Vec<XT> = Vec::new();

    for row in 0..x.nrows() {
        if !active[row] {
            continue;
        }

        let threshold = x[(row, dimension)];
        if visited.iter().any(|seen| *seen == threshold) {
            continue;
        }
        visited.push(threshold);

        left_counts.fill(0);
        right_counts.fill(0);
        let mut left_total = 0usize;
        let mut right_total = 0usize;

        for other in 0..x.nrows() {
            if !active[other] {
                continue;
            }

            let slot = class_index.index_of(y[other]);
            if x[(other, dimension)] <= threshold {
                left_counts[slot] += 1;
                left_total += 1;
            } else {
                right_counts[slot] += 1;
                right_total += 1;
            }
        }

        let gain = base_impurity
            - (left_total as f64 / active_total as f64) * gini_impurity(&left_counts)
            - (right_total as f64 / active_total as f64) * gini_impurity(&right_counts);

        if gain > best_gain {
            best_gain = gain;
            best = Some(SplitDecision {
                threshold,
                gain,
                dimension,
                left_class: majority_class(&left_counts, class_index),
                right_class: majority_class(&right_counts, class_index),
            });
        }
    }

    best
}

/// Most frequent class on one side of a split; a tie goes to the lowest
/// dense class index, i.e. the class encountered first in the labels.
fn majority_class<YT: WholeNumber>(counts: &[usize], class_index: &ClassIndex<YT>) -> YT {
    let mut top = 0usize;
    for (slot, &count) in counts.iter().enumerate() {
        if count > counts[top] {
            top = slot;
        }
    }
    class_index.class_at(top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_cluster_1d() -> (DMatrix<f64>, DVector<i32>) {
        let x = DMatrix::from_row_slice(
            10,
            1,
            &[0.2, 0.5, 0.6, 1.0, 1.8, 2.3, 2.4, 2.5, 2.5, 2.9],
        );
        let y = DVector::from_vec(vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        (x, y)
    }

    #[test]
    fn test_class_index_first_appearance_order() {
        let y = DVector::from_vec(vec![7, 3, 7, 5, 3]);
        let index = ClassIndex::from_labels(&y);

        assert_eq!(index.len(), 3);
        assert_eq!(index.index_of(7), 0);
        assert_eq!(index.index_of(3), 1);
        assert_eq!(index.index_of(5), 2);
        assert_eq!(index.class_at(1), 3);
    }

    #[test]
    fn test_best_split_single_dimension_clusters() {
        let (x, y) = two_cluster_1d();
        let class_index = ClassIndex::from_labels(&y);
        let active = vec![true; 10];

        let split = best_split(&x, &y, &class_index, &active, None)
            .unwrap()
            .unwrap();

        assert_eq!(split.threshold, 1.8);
        assert_eq!(split.dimension, 0);
        assert_eq!(split.left_class, 0);
        assert_eq!(split.right_class, 1);
        assert_abs_diff_eq!(split.gain, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_best_split_pure_node_has_no_split() {
        let x = DMatrix::from_row_slice(4, 1, &[0.1, 0.2, 0.3, 0.4]);
        let y = DVector::from_vec(vec![1, 1, 1, 1]);
        let class_index = ClassIndex::from_labels(&y);

        let split = best_split(&x, &y, &class_index, &[true; 4], None).unwrap();
        assert!(split.is_none());
    }

    #[test]
    fn test_best_split_ignores_inactive_rows() {
        let x = DMatrix::from_row_slice(6, 1, &[0.1, 0.2, 0.3, 5.0, 6.0, 7.0]);
        let y = DVector::from_vec(vec![0, 0, 0, 0, 1, 1]);
        let class_index = ClassIndex::from_labels(&y);

        // Row 3 carries the only class-0 observation above 1.0; with it
        // deactivated the remaining rows split cleanly at 0.3.
        let active = vec![true, true, true, false, true, true];
        let split = best_split(&x, &y, &class_index, &active, None)
            .unwrap()
            .unwrap();

        assert_eq!(split.threshold, 0.3);
        assert_eq!(split.left_class, 0);
        assert_eq!(split.right_class, 1);
        assert_abs_diff_eq!(split.gain, 0.48, epsilon = 1e-12);
    }

    #[test]
    fn test_best_split_no_active_rows() {
        let (x, y) = two_cluster_1d();
        let class_index = ClassIndex::from_labels(&y);

        let split = best_split(&x, &y, &class_index, &[false; 10], None).unwrap();
        assert!(split.is_none());
    }

    #[test]
    fn test_best_split_feature_mask_excludes_dimension() {
        // Dimension 0 separates perfectly; dimension 1 only partially.
        let x = DMatrix::from_row_slice(
            6,
            2,
            &[
                0.1, 1.0, //
                0.2, 2.0, //
                0.3, 5.0, //
                5.1, 3.0, //
                5.2, 6.0, //
                5.3, 7.0, //
            ],
        );
        let y = DVector::from_vec(vec![0, 0, 0, 1, 1, 1]);
        let class_index = ClassIndex::from_labels(&y);
        let active = vec![true; 6];

        let unmasked = best_split(&x, &y, &class_index, &active, None)
            .unwrap()
            .unwrap();
        assert_eq!(unmasked.dimension, 0);

        let masked = best_split(&x, &y, &class_index, &active, Some(&[false, true]))
            .unwrap()
            .unwrap();
        assert_eq!(masked.dimension, 1);
    }

    #[test]
    fn test_best_split_tied_dimensions_prefer_the_lowest() {
        // Identical columns, identical gains everywhere.
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        let y = DVector::from_vec(vec![0, 0, 1, 1]);
        let class_index = ClassIndex::from_labels(&y);

        let split = best_split(&x, &y, &class_index, &[true; 4], None)
            .unwrap()
            .unwrap();
        assert_eq!(split.dimension, 0);
        assert_eq!(split.threshold, 2.0);
    }

    #[test]
    fn test_best_split_length_mismatch_fails() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let y = DVector::from_vec(vec![0, 1]);
        let class_index = ClassIndex::from_labels(&y);

        assert!(best_split(&x, &y, &class_index, &[true; 3], None).is_err());
    }

    #[test]
    fn test_best_split_feature_mask_length_mismatch_fails() {
        let (x, y) = two_cluster_1d();
        let class_index = ClassIndex::from_labels(&y);

        let result = best_split(&x, &y, &class_index, &[true; 10], Some(&[true, true]));
        assert!(result.is_err());
    }

    #[test]
    fn test_majority_tie_takes_the_first_encountered_class() {
        let y = DVector::from_vec(vec![4, 9, 4, 9]);
        let class_index = ClassIndex::from_labels(&y);

        assert_eq!(majority_class(&[2, 2], &class_index), 4);
    }
}
