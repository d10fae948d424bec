//! Trained classifier variants
//!
//! The two training algorithms behind one tagged union. The serialized form
//! carries an explicit `algorithm` discriminant so a stored model can never
//! be loaded as the wrong kind.

use super::gradient_boosting::GbdtClassifier;
use super::random_forest::RandomForestClassifier;
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Training algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    RandomForest,
    GradientBoosting,
}

impl Default for Algorithm {
    fn default() -> Self {
        Algorithm::RandomForest
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::RandomForest => write!(f, "random_forest"),
            Algorithm::GradientBoosting => write!(f, "gradient_boosting"),
        }
    }
}

/// A trained churn classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum Classifier {
    RandomForest(RandomForestClassifier),
    GradientBoosting(GbdtClassifier),
}

impl Classifier {
    /// Which algorithm produced this model.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Classifier::RandomForest(_) => Algorithm::RandomForest,
            Classifier::GradientBoosting(_) => Algorithm::GradientBoosting,
        }
    }

    /// Churn probability per row.
    pub fn predict_probability(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::RandomForest(model) => model.predict_probability(x),
            Classifier::GradientBoosting(model) => model.predict_probability(x),
        }
    }

    /// Discrete class labels: probability above 0.5 means churn.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::RandomForest(model) => model.predict(x),
            Classifier::GradientBoosting(model) => model.predict(x),
        }
    }

    /// Number of feature columns the model was trained on.
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::RandomForest(model) => model.n_features(),
            Classifier::GradientBoosting(model) => model.n_features(),
        }
    }

    /// Native split-gain importances, when the algorithm exposes them.
    pub fn native_importances(&self) -> Option<&[f64]> {
        match self {
            Classifier::RandomForest(model) => model.feature_importances(),
            Classifier::GradientBoosting(_) => None,
        }
    }

    /// Serialize to the portable JSON form stored in model artifacts.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load a classifier back from its stored JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ChurnError::SerializationError(format!("malformed model JSON: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fitted_forest() -> Classifier {
        let x = array![[1.0], [2.0], [10.0], [11.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut forest = RandomForestClassifier::new(5).with_seed(42);
        forest.fit(&x, &y).unwrap();
        Classifier::RandomForest(forest)
    }

    #[test]
    fn test_algorithm_discriminant_in_json() {
        let json = fitted_forest().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["algorithm"], "random_forest");
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let model = fitted_forest();
        let x = array![[1.5], [10.5]];
        let before = model.predict_probability(&x).unwrap();

        let restored = Classifier::from_json(&model.to_json().unwrap()).unwrap();
        let after = restored.predict_probability(&x).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let result = Classifier::from_json("{\"algorithm\": \"svm\"}");
        assert!(matches!(result, Err(ChurnError::SerializationError(_))));
    }

    #[test]
    fn test_gbdt_has_no_native_importances() {
        let x = array![[1.0], [2.0], [10.0], [11.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut gbdt = GbdtClassifier::new(3);
        gbdt.fit(&x, &y).unwrap();
        let model = Classifier::GradientBoosting(gbdt);
        assert!(model.native_importances().is_none());
    }
}
