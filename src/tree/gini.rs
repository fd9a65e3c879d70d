/// Gini impurity of a node described by its per-class counts.
///
/// Returns a value in `[0, 1 - 1/k]` for `k` classes; 0 means the node is
/// pure. An all-zero count vector is treated as pure.
pub fn gini_impurity(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    counts
        .iter()
        .map(|&count| {
            let fraction = count as f64 / total;
            fraction * (1.0 - fraction)
        })
        .sum()
}
