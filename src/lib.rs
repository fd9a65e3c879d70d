//! # Arbor
//!
//! `arbor` induces binary decision-tree classifiers from labeled numeric
//! observations and picks the tree depth that generalizes best using k-fold
//! cross-validation. It also ships a raw-row encoder for textual records and
//! classification evaluation metrics.
//!
//! ## Getting Started
//!
//! To use `arbor`, add the following to your `Cargo.toml` file:
//!
//! ```toml
//! [dependencies]
//! arbor = "*"
//! ```
//!
//! ## Example Usage
//!
//! Training on an already-numeric dataset and classifying new records:
//!
//! ```rust
//! use arbor::data::dataset::Dataset;
//! use arbor::trainer::{self, TrainerOptions};
//! use nalgebra::{DMatrix, DVector};
//!
//! let x = DMatrix::from_row_slice(6, 1, &[0.2, 0.5, 0.6, 2.3, 2.4, 2.9]);
//! let y = DVector::from_vec(vec![0, 0, 0, 1, 1, 1]);
//! let dataset = Dataset::new(x, y);
//!
//! let tree = trainer::train(&dataset, &TrainerOptions::new()).unwrap();
//!
//! assert_eq!(tree.predict(&[0.4]), Some(0));
//! assert_eq!(tree.predict(&[2.6]), Some(1));
//! ```

/// Dataset container, fold partitioning and raw-row encoding
pub mod data;
/// Functions for evaluating classifier performance
pub mod metrics;
/// Cross-validated depth search
pub mod trainer;
/// Decision tree induction and prediction
pub mod tree;
