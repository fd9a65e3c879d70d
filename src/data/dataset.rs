use nalgebra::{DMatrix, DVector};
use num_traits::{FromPrimitive, Num, ToPrimitive};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use std::cmp::PartialOrd;
use std::error::Error;
use std::fmt::{Debug, Display};
use std::hash::Hash;

pub trait DataValue:
    Debug + Clone + Copy + Num + FromPrimitive + ToPrimitive + Send + Sync + Display + 'static
{
}

impl<T> DataValue for T where
    T: Debug + Clone + Copy + Num + FromPrimitive + ToPrimitive + Send + Sync + Display + 'static
{
}

/// Feature values: anything orderable so thresholds can partition them.
pub trait Number: DataValue + PartialOrd {}
impl<T> Number for T where T: DataValue + PartialOrd {}

/// Class labels: hashable integers so they can key a dense class index.
pub trait WholeNumber: Number + Eq + Hash {}
impl<T> WholeNumber for T where T: Number + Eq + Hash {}

/// A feature matrix with one class label per row.
#[derive(Clone, Debug)]
pub struct Dataset<XT: Number, YT: WholeNumber> {
    pub x: DMatrix<XT>,
    pub y: DVector<YT>,
}

impl<XT: Number, YT: WholeNumber> Dataset<XT, YT> {
    pub fn new(x: DMatrix<XT>, y: DVector<YT>) -> Self {
        Self { x, y }
    }

    pub fn into_parts(&self) -> (&DMatrix<XT>, &DVector<YT>) {
        (&self.x, &self.y)
    }

    pub fn is_not_empty(&self) -> bool {
        !(self.x.is_empty() || self.y.is_empty())
    }

    pub fn nrows(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    /// Copies the given rows, in the given order, into a new dataset.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> Self {
        if indices.is_empty() {
            return Self::new(DMatrix::zeros(0, self.x.ncols()), DVector::zeros(0));
        }

        let rows = indices
            .iter()
            .map(|&index| self.x.row(index))
            .collect::<Vec<_>>();
        let labels = indices.iter().map(|&index| self.y[index]).collect::<Vec<_>>();

        Self::new(DMatrix::from_rows(&rows), DVector::from_vec(labels))
    }

    pub fn train_test_split(
        &self,
        train_size: f64,
        seed: Option<u64>,
    ) -> Result<(Self, Self), Box<dyn Error>> {
        if !(0.0..=1.0).contains(&train_size) {
            return Err("Train size should be between 0.0 and 1.0".into());
        }
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut indices = (0..self.x.nrows()).collect::<Vec<_>>();
        indices.shuffle(&mut rng);
        let train_count = (self.x.nrows() as f64 * train_size).floor() as usize;

        let train = self.select_rows(&indices[..train_count]);
        let test = self.select_rows(&indices[train_count..]);

        Ok((train, test))
    }
}
