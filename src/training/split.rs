//! Seeded train/test partitioning

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::{RealtyError, Result};

/// Rows assigned to each partition, in the shuffled order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Materialized training and test partitions
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
}

/// Shuffle `0..n_samples` with a fixed seed and cut off the test fraction.
/// The test partition gets `ceil(n_samples * test_size)` rows; both partitions
/// are non-empty.
pub fn split_indices(n_samples: usize, test_size: f64, seed: u64) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(RealtyError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }
    if n_samples < 2 {
        return Err(RealtyError::TrainingError(format!(
            "need at least 2 samples to split, got {n_samples}"
        )));
    }

    let n_test = ((n_samples as f64 * test_size).ceil() as usize).clamp(1, n_samples - 1);

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if x.nrows() != y.len() {
        return Err(RealtyError::ShapeError {
            expected: format!("{} targets", x.nrows()),
            actual: format!("{} targets", y.len()),
        });
    }

    let indices = split_indices(x.nrows(), test_size, seed)?;
    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &indices.train),
        y_train: y.select(Axis(0), &indices.train),
        x_test: x.select(Axis(0), &indices.test),
        y_test: y.select(Axis(0), &indices.test),
    })
}
