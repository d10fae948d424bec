//! Training configuration

use super::classifier::Algorithm;
use crate::error::{ChurnError, Result};
use serde::{Deserialize, Serialize};

fn default_test_fraction() -> f64 {
    0.2
}

fn default_n_estimators() -> usize {
    50
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_importance_repeats() -> usize {
    1
}

/// Configuration for one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingConfig {
    /// Target column to predict
    pub target_variable: String,

    /// Ordered feature columns; this order is fixed for the model's lifetime
    pub features: Vec<String>,

    /// Training algorithm
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Fraction of rows held out for evaluation
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Number of trees / boosting rounds
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,

    /// Maximum tree depth (None = per-algorithm default)
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Boosting learning rate
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Random seed; None draws from entropy (non-reproducible)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Shuffle repeats for permutation importance
    #[serde(default = "default_importance_repeats")]
    pub importance_repeats: usize,
}

impl TrainingConfig {
    /// Create a configuration with default hyperparameters.
    pub fn new(target: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            target_variable: target.into(),
            features,
            algorithm: Algorithm::default(),
            test_fraction: default_test_fraction(),
            n_estimators: default_n_estimators(),
            max_depth: None,
            learning_rate: default_learning_rate(),
            seed: None,
            importance_repeats: default_importance_repeats(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_importance_repeats(mut self, repeats: usize) -> Self {
        self.importance_repeats = repeats.max(1);
        self
    }

    /// Tree depth for the forest (default 10).
    pub fn forest_depth(&self) -> usize {
        self.max_depth.unwrap_or(10)
    }

    /// Tree depth for boosting rounds (default 5).
    pub fn boosting_depth(&self) -> usize {
        self.max_depth.unwrap_or(5)
    }

    /// Reject invalid configurations before any computation starts.
    pub fn validate(&self) -> Result<()> {
        if self.target_variable.is_empty() {
            return Err(ChurnError::ConfigError(
                "target variable is required".to_string(),
            ));
        }
        if self.features.is_empty() {
            return Err(ChurnError::ConfigError(
                "at least one feature is required".to_string(),
            ));
        }
        if self.features.iter().any(|f| f == &self.target_variable) {
            return Err(ChurnError::ConfigError(format!(
                "target '{}' cannot also be a feature",
                self.target_variable
            )));
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            return Err(ChurnError::ConfigError(format!(
                "test fraction must be in [0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.n_estimators == 0 {
            return Err(ChurnError::ConfigError(
                "at least one estimator is required".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(ChurnError::ConfigError(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}
