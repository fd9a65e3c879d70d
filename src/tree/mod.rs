//! Decision tree induction and prediction
/// Gini impurity
pub mod gini;
/// Tree node and split decision types
pub mod node;
/// Best-split search
pub mod splitter;

use crate::data::dataset::{Dataset, Number, WholeNumber};
use crate::metrics::ClassificationMetrics;
use nalgebra::{DMatrix, DVector};
use node::{DecisionNode, SplitDecision};
use splitter::{best_split, ClassIndex};
use std::error::Error;

/// Limits applied while growing a tree.
#[derive(Clone, Debug, Default)]
pub struct TreeOptions {
    max_depth: Option<u16>,
    feature_mask: Option<Vec<bool>>,
}

impl TreeOptions {
    pub fn new() -> Self {
        Self {
            max_depth: None,
            feature_mask: None,
        }
    }

    /// `None` grows until no split gains anything; `Some(0)` forbids even the
    /// root, producing an empty tree.
    pub fn set_max_depth(&mut self, max_depth: Option<u16>) {
        self.max_depth = max_depth;
    }

    pub fn set_feature_mask(&mut self, feature_mask: Option<Vec<bool>>) {
        self.feature_mask = feature_mask;
    }

    pub fn max_depth(&self) -> Option<u16> {
        self.max_depth
    }

    pub fn feature_mask(&self) -> Option<&[bool]> {
        self.feature_mask.as_deref()
    }
}

/// A binary decision tree classifier.
///
/// An empty tree means no tree could be induced: a zero depth limit, a single
/// class in the labels, or no split with positive gain at the root.
#[derive(Debug)]
pub struct DecisionTree<XT: Number, YT: WholeNumber> {
    root: Option<Box<DecisionNode<XT, YT>>>,
}

impl<XT: Number, YT: WholeNumber> ClassificationMetrics<YT> for DecisionTree<XT, YT> {}

impl<XT: Number, YT: WholeNumber> DecisionTree<XT, YT> {
    pub fn empty() -> Self {
        Self { root: None }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&DecisionNode<XT, YT>> {
        self.root.as_deref()
    }

    /// Grows a tree over the whole dataset, bounded by `options`.
    ///
    /// # Errors
    ///
    /// Fails when the feature and label row counts disagree, or when a
    /// supplied feature mask does not cover every dimension.
    pub fn build(dataset: &Dataset<XT, YT>, options: &TreeOptions) -> Result<Self, Box<dyn Error>> {
        let (x, y) = dataset.into_parts();

        if x.nrows() != y.len() {
            return Err(format!(
                "The number of classes {} does not match the number of observations {}.",
                y.len(),
                x.nrows()
            )
            .into());
        }

        if let Some(mask) = options.feature_mask() {
            if mask.len() != x.ncols() {
                return Err(format!(
                    "Feature mask length {} does not match the number of dimensions {}.",
                    mask.len(),
                    x.ncols()
                )
                .into());
            }
        }

        if options.max_depth() == Some(0) {
            return Ok(Self::empty());
        }

        let class_index = ClassIndex::from_labels(y);
        if class_index.len() < 2 {
            return Ok(Self::empty());
        }

        let mut ancestors = Vec::new();
        let root = split_recursive(x, y, &class_index, options, 0, &mut ancestors)?;

        Ok(Self {
            root: root.map(Box::new),
        })
    }

    /// Classifies a single record, or `None` when there is no model.
    pub fn predict(&self, record: &[XT]) -> Option<YT> {
        self.root.as_ref().map(|root| root.predict(record))
    }

    /// Classifies every row of `features`.
    ///
    /// # Errors
    ///
    /// Fails when the tree is empty.
    pub fn predict_batch(&self, features: &DMatrix<XT>) -> Result<DVector<YT>, Box<dyn Error>> {
        let root = self.root.as_ref().ok_or("Tree wasn't built yet.")?;

        let predictions = features
            .row_iter()
            .map(|row| {
                let record = row.iter().copied().collect::<Vec<_>>();
                root.predict(&record)
            })
            .collect::<Vec<_>>();

        Ok(DVector::from_vec(predictions))
    }
}

fn split_recursive<XT: Number, YT: WholeNumber>(
    x: &DMatrix<XT>,
    y: &DVector<YT>,
    class_index: &ClassIndex<YT>,
    options: &TreeOptions,
    depth: u16,
    ancestors: &mut Vec<(SplitDecision<XT, YT>, bool)>,
) -> Result<Option<DecisionNode<XT, YT>>, Box<dyn Error>> {
    if options.max_depth().is_some_and(|limit| depth >= limit) {
        return Ok(None);
    }

    let active = active_rows(x, ancestors);

    let decision = match best_split(x, y, class_index, &active, options.feature_mask())? {
        Some(decision) => decision,
        None => return Ok(None),
    };

    if decision.gain == 0.0 {
        return Ok(None);
    }

    ancestors.push((decision.clone(), true));
    let left = split_recursive(x, y, class_index, options, depth + 1, ancestors)?;
    ancestors.pop();

    ancestors.push((decision.clone(), false));
    let right = split_recursive(x, y, class_index, options, depth + 1, ancestors)?;
    ancestors.pop();

    Ok(Some(DecisionNode {
        decision,
        left: left.map(Box::new),
        right: right.map(Box::new),
    }))
}

/// Membership of every row under the full list of ancestor decisions. Each
/// node gets a fresh mask, so sibling branches never observe each other's
/// mutations.
fn active_rows<XT: Number, YT: WholeNumber>(
    x: &DMatrix<XT>,
    ancestors: &[(SplitDecision<XT, YT>, bool)],
) -> Vec<bool> {
    (0..x.nrows())
        .map(|row| {
            ancestors.iter().all(|(decision, took_left)| {
                let value = x[(row, decision.dimension)];
                if *took_left {
                    value <= decision.threshold
                } else {
                    value > decision.threshold
                }
            })
        })
        .collect()
}
