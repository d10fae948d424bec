//! Train/test splitting

use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A train/test partition of a feature matrix and label vector.
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: Array2<f64>,
    pub y_train: Array1<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array1<f64>,
}

/// Shuffle rows and partition them into train and test sets.
///
/// The first `floor(n * (1 - test_fraction))` shuffled indices become the
/// training set; the remainder become the test set. With a seed the split is
/// fully reproducible; without one it draws from entropy. A zero-row input
/// or a fraction that leaves the test set empty is fine; downstream metrics
/// handle empty splits with zero fallbacks.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_fraction: f64,
    seed: Option<u64>,
) -> Split {
    let n = x.nrows();
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    indices.shuffle(&mut rng);

    let train_count = ((n as f64) * (1.0 - test_fraction)).floor() as usize;
    let (train_idx, test_idx) = indices.split_at(train_count.min(n));

    Split {
        x_train: x.select(Axis(0), train_idx),
        y_train: Array1::from_iter(train_idx.iter().map(|&i| y[i])),
        x_test: x.select(Axis(0), test_idx),
        y_test: Array1::from_iter(test_idx.iter().map(|&i| y[i])),
    }
}
