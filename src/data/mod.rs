/// Dataset container and numeric trait aliases
pub mod dataset;
/// Raw string-row to numeric dataset encoding
pub mod encoding;
/// Cross-validation fold partitioning
pub mod folds;
