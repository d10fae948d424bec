//! Feature importance attribution
//!
//! Two paths: the forest's native split-gain importances, and permutation
//! importance for models that do not expose any (the boosted ensemble).
//! Permutation importance shuffles one feature column at a time on the
//! held-out split and measures the accuracy drop. A single shuffle pass is
//! the default; it is inherently noisy, and callers wanting stability can
//! raise the repeat count to average over draws.

use crate::error::{ChurnError, Result};
use crate::training::Classifier;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::collections::BTreeMap;

/// Uniform importance over `features`, the degraded-mode fallback when no
/// importance signal is available.
pub fn uniform_importance(features: &[String]) -> BTreeMap<String, f64> {
    let weight = if features.is_empty() {
        0.0
    } else {
        1.0 / features.len() as f64
    };
    features.iter().map(|f| (f.clone(), weight)).collect()
}

/// Pair raw weights with feature names, normalizing so they sum to 1. When
/// every weight is zero the total divisor defaults to 1, leaving the zeros
/// in place rather than dividing by zero.
pub fn normalize_importance(features: &[String], weights: &[f64]) -> BTreeMap<String, f64> {
    let total: f64 = weights.iter().sum();
    let divisor = if total > 0.0 { total } else { 1.0 };
    features
        .iter()
        .zip(weights.iter())
        .map(|(feature, &weight)| (feature.clone(), weight / divisor))
        .collect()
}

fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(&t, &p)| (t > 0.5) == (p > 0.5))
        .count();
    correct as f64 / y_true.len() as f64
}

/// Permutation importance calculator.
#[derive(Debug, Clone, Copy)]
pub struct PermutationImportance {
    seed: u64,
    n_repeats: usize,
}

impl Default for PermutationImportance {
    fn default() -> Self {
        Self::new()
    }
}

impl PermutationImportance {
    pub fn new() -> Self {
        Self {
            seed: 42,
            n_repeats: 1,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_repeats(mut self, n_repeats: usize) -> Self {
        self.n_repeats = n_repeats.max(1);
        self
    }

    /// Raw (un-normalized) importance per feature: the baseline accuracy
    /// minus the accuracy after shuffling that feature's column, floored
    /// at zero and averaged over repeats.
    pub fn compute(
        &self,
        model: &Classifier,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<Vec<f64>> {
        if x.nrows() == 0 {
            return Err(ChurnError::DataError(
                "cannot compute permutation importance on an empty split".to_string(),
            ));
        }

        let baseline = accuracy(y, &model.predict(x)?);
        let n_features = x.ncols();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut raw = vec![0.0; n_features];

        for _ in 0..self.n_repeats {
            for feature in 0..n_features {
                let mut shuffled: Vec<f64> = x.column(feature).to_vec();
                shuffled.shuffle(&mut rng);

                let mut x_permuted = x.clone();
                for (i, value) in shuffled.into_iter().enumerate() {
                    x_permuted[[i, feature]] = value;
                }

                let permuted = accuracy(y, &model.predict(&x_permuted)?);
                raw[feature] += (baseline - permuted).max(0.0);
            }
        }

        for value in &mut raw {
            *value /= self.n_repeats as f64;
        }
        Ok(raw)
    }
}
