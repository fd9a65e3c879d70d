//! Cross-validation fold partitioning.
use super::dataset::{Dataset, Number, WholeNumber};
use rand::Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// What happens to the `n % k` rows left over once every bucket holds
/// `n / k` rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RemainderPolicy {
    /// Leftover rows join the last bucket, so the fold test partitions are an
    /// exact partition of the row set.
    #[default]
    AbsorbIntoLast,
    /// Leftover rows are dropped and appear in no fold.
    Discard,
}

/// One train/test round of a cross-validation run.
pub struct Fold<XT: Number, YT: WholeNumber> {
    pub train: Dataset<XT, YT>,
    pub test: Dataset<XT, YT>,
}

/// Splits `dataset` into `k` folds with randomized, near-equal bucket sizes.
///
/// Each bucket is filled by drawing uniformly from the still-unassigned row
/// indices, so a fixed rng seed reproduces the exact same folds. Row order
/// inside each partition follows the original dataset order.
pub fn partition<XT: Number, YT: WholeNumber, R: Rng>(
    dataset: &Dataset<XT, YT>,
    k: usize,
    policy: RemainderPolicy,
    rng: &mut R,
) -> Vec<Fold<XT, YT>> {
    if k == 0 {
        return Vec::new();
    }

    let n = dataset.nrows();

    if k == 1 {
        return vec![Fold {
            train: dataset.clone(),
            test: dataset.select_rows(&[]),
        }];
    }

    let base = n / k;

    let mut assignments: Vec<Option<usize>> = vec![None; n];
    let mut unassigned: Vec<usize> = (0..n).collect();

    for bucket in 0..k {
        for _ in 0..base {
            let drawn = rng.gen_range(0..unassigned.len());
            let row = unassigned.swap_remove(drawn);
            assignments[row] = Some(bucket);
        }
    }

    if policy == RemainderPolicy::AbsorbIntoLast {
        for row in unassigned {
            assignments[row] = Some(k - 1);
        }
    }

    // Bucket labels are fixed now, so each fold can be assembled independently.
    (0..k)
        .into_par_iter()
        .map(|bucket| {
            let mut train_rows = Vec::with_capacity(n - base);
            let mut test_rows = Vec::with_capacity(base);

            for (row, assigned) in assignments.iter().enumerate() {
                match assigned {
                    Some(b) if *b == bucket => test_rows.push(row),
                    Some(_) => train_rows.push(row),
                    None => {}
                }
            }

            Fold {
                train: dataset.select_rows(&train_rows),
                test: dataset.select_rows(&test_rows),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{DMatrix, DVector};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn numbered_dataset(n: usize) -> Dataset<f64, i32> {
        let x = DMatrix::from_fn(n, 2, |r, c| (r * 2 + c) as f64);
        let y = DVector::from_fn(n, |r, _| r as i32);
        Dataset::new(x, y)
    }

    fn test_labels(fold: &Fold<f64, i32>) -> Vec<i32> {
        fold.test.y.iter().copied().collect()
    }

    #[test]
    fn test_partition_no_folds() {
        let dataset = numbered_dataset(4);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(partition(&dataset, 0, RemainderPolicy::default(), &mut rng).is_empty());
    }

    #[test]
    fn test_partition_single_fold_trains_on_everything() {
        let dataset = numbered_dataset(4);
        let mut rng = StdRng::seed_from_u64(1);
        let folds = partition(&dataset, 1, RemainderPolicy::default(), &mut rng);

        assert_eq!(folds.len(), 1);
        assert_eq!(folds[0].train.nrows(), 4);
        assert_eq!(folds[0].test.nrows(), 0);
        assert_eq!(folds[0].test.ncols(), 2);
    }

    #[test]
    fn test_partition_test_sets_partition_the_rows() {
        let dataset = numbered_dataset(10);
        let mut rng = StdRng::seed_from_u64(77);
        let folds = partition(&dataset, 3, RemainderPolicy::AbsorbIntoLast, &mut rng);

        assert_eq!(folds.len(), 3);

        let mut seen = HashSet::new();
        let mut total = 0;
        for fold in &folds {
            assert_eq!(fold.train.nrows() + fold.test.nrows(), 10);
            for label in test_labels(fold) {
                assert!(seen.insert(label));
                total += 1;
            }
        }
        assert_eq!(total, 10);
    }

    #[test]
    fn test_partition_uneven_remainder_goes_to_last_fold() {
        let dataset = numbered_dataset(6);
        let mut rng = StdRng::seed_from_u64(25065);
        let folds = partition(&dataset, 5, RemainderPolicy::AbsorbIntoLast, &mut rng);

        assert_eq!(folds.len(), 5);
        for fold in &folds[..4] {
            assert_eq!(fold.test.nrows(), 1);
            assert_eq!(fold.train.nrows(), 5);
        }
        assert_eq!(folds[4].test.nrows(), 2);
        assert_eq!(folds[4].train.nrows(), 4);
    }

    #[test]
    fn test_partition_discard_drops_the_remainder() {
        let dataset = numbered_dataset(6);
        let mut rng = StdRng::seed_from_u64(25065);
        let folds = partition(&dataset, 5, RemainderPolicy::Discard, &mut rng);

        for fold in &folds {
            assert_eq!(fold.test.nrows(), 1);
            assert_eq!(fold.train.nrows(), 4);
        }
    }

    #[test]
    fn test_partition_preserves_row_order_within_partitions() {
        let dataset = numbered_dataset(9);
        let mut rng = StdRng::seed_from_u64(3);
        let folds = partition(&dataset, 3, RemainderPolicy::AbsorbIntoLast, &mut rng);

        for fold in &folds {
            let train = fold.train.y.iter().copied().collect::<Vec<_>>();
            let mut sorted = train.clone();
            sorted.sort_unstable();
            assert_eq!(train, sorted);
        }
    }

    #[test]
    fn test_partition_seeded_is_reproducible() {
        let dataset = numbered_dataset(12);

        let mut rng_a = StdRng::seed_from_u64(164562);
        let mut rng_b = StdRng::seed_from_u64(164562);
        let folds_a = partition(&dataset, 4, RemainderPolicy::AbsorbIntoLast, &mut rng_a);
        let folds_b = partition(&dataset, 4, RemainderPolicy::AbsorbIntoLast, &mut rng_b);

        for (a, b) in folds_a.iter().zip(folds_b.iter()) {
            assert_eq!(test_labels(a), test_labels(b));
        }
    }
}
