use crate::data::dataset::{Number, WholeNumber};

/// The outcome of one best-split search, fixed for the lifetime of a node.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitDecision<XT: Number, YT: WholeNumber> {
    pub threshold: XT,
    pub gain: f64,
    pub dimension: usize,
    pub left_class: YT,
    pub right_class: YT,
}

/// Binary decision tree node
#[derive(Debug)]
pub struct DecisionNode<XT: Number, YT: WholeNumber> {
    pub decision: SplitDecision<XT, YT>,
    pub left: Option<Box<DecisionNode<XT, YT>>>,
    pub right: Option<Box<DecisionNode<XT, YT>>>,
}

impl<XT: Number, YT: WholeNumber> DecisionNode<XT, YT> {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Walks down the tree, answering the stored side majority class wherever
    /// a child is absent.
    pub fn predict(&self, record: &[XT]) -> YT {
        let value = record[self.decision.dimension];
        if value <= self.decision.threshold {
            match &self.left {
                Some(node) => node.predict(record),
                None => self.decision.left_class,
            }
        } else {
            match &self.right {
                Some(node) => node.predict(record),
                None => self.decision.right_class,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(threshold: f64, dimension: usize, left: i32, right: i32) -> SplitDecision<f64, i32> {
        SplitDecision {
            threshold,
            gain: 0.5,
            dimension,
            left_class: left,
            right_class: right,
        }
    }

    #[test]
    fn test_leaf_answers_its_majority_classes() {
        let node = DecisionNode {
            decision: decision(1.0, 0, 7, 9),
            left: None,
            right: None,
        };

        assert!(node.is_leaf());
        assert_eq!(node.predict(&[0.5]), 7);
        assert_eq!(node.predict(&[1.0]), 7);
        assert_eq!(node.predict(&[1.5]), 9);
    }

    #[test]
    fn test_traversal_descends_into_present_children() {
        let child = DecisionNode {
            decision: decision(5.0, 1, 2, 3),
            left: None,
            right: None,
        };
        let root = DecisionNode {
            decision: decision(1.0, 0, 1, 2),
            left: None,
            right: Some(Box::new(child)),
        };

        assert!(!root.is_leaf());
        assert_eq!(root.predict(&[0.0, 9.0]), 1);
        assert_eq!(root.predict(&[2.0, 4.0]), 2);
        assert_eq!(root.predict(&[2.0, 6.0]), 3);
    }
}
