//! Stateless inference
//!
//! Rebuilds feature vectors from raw customer records using exactly the
//! artifact's stored feature order and encoding map, then runs the
//! deserialized model. No training-time statistics exist at this point, so
//! unseen or missing values default to 0 instead of being imputed.

use crate::artifact::ModelArtifact;
use crate::dataset::{cell_to_string, is_missing, Row};
use crate::error::{ChurnError, Result};
use crate::training::Classifier;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Upper bound on rows per batch call; larger datasets must be chunked by
/// the caller.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Prediction for a single customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub churn_probability: f64,
    /// 1 = predicted to churn
    pub prediction: u8,
    /// Linear proxy contributions per feature; informational only, not SHAP
    pub feature_contributions: BTreeMap<String, f64>,
}

/// Result of a batch prediction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPrediction {
    pub predictions: Vec<PredictionResult>,
    pub total: usize,
}

/// Coerce a raw non-categorical cell to a number, defaulting to 0.
fn coerce_numeric(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Serves predictions from one deserialized model artifact.
///
/// Pure: holds no mutable state, so predictions depend only on the artifact
/// and the presented record.
#[derive(Debug)]
pub struct InferenceEngine {
    artifact: ModelArtifact,
    model: Classifier,
}

impl InferenceEngine {
    /// Deserialize the artifact's model and validate it against the
    /// artifact's feature list.
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        let model = artifact.load_model()?;
        Ok(Self { artifact, model })
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    /// Encode a raw record into the model's feature vector using the stored
    /// encoding map and feature order.
    pub fn encode_record(&self, record: &Row) -> Vec<f64> {
        self.artifact
            .features
            .iter()
            .map(|feature| {
                let value = record.get(feature);
                match self.artifact.encoding_map.get(feature) {
                    Some(encoding) => {
                        if is_missing(value) {
                            0.0
                        } else {
                            encoding.code_or_default(&cell_to_string(
                                value.expect("non-missing cell"),
                            ))
                        }
                    }
                    None => coerce_numeric(value),
                }
            })
            .collect()
    }

    /// Predict churn for a single customer record.
    pub fn predict_one(&self, record: &Row) -> Result<PredictionResult> {
        let vector = self.encode_record(record);
        let x = Array2::from_shape_vec((1, vector.len()), vector.clone())?;

        let churn_probability = self.model.predict_probability(&x)?[0];
        let prediction = u8::from(churn_probability > 0.5);

        let direction = if prediction == 1 { 1.0 } else { -1.0 };
        let feature_contributions = self
            .artifact
            .features
            .iter()
            .zip(vector.iter())
            .map(|(feature, &value)| {
                let importance = self
                    .artifact
                    .feature_importance
                    .get(feature)
                    .copied()
                    .unwrap_or(0.0);
                (feature.clone(), importance * (value - 0.5) * direction)
            })
            .collect();

        Ok(PredictionResult {
            churn_probability,
            prediction,
            feature_contributions,
        })
    }

    /// Predict churn for up to [`MAX_BATCH_SIZE`] records in one call.
    /// Rows are independent, so the batch runs in parallel.
    pub fn predict_batch(&self, records: &[Row]) -> Result<BatchPrediction> {
        if records.len() > MAX_BATCH_SIZE {
            return Err(ChurnError::BatchLimitExceeded {
                got: records.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        let predictions: Result<Vec<PredictionResult>> =
            records.par_iter().map(|record| self.predict_one(record)).collect();
        let predictions = predictions?;
        let total = predictions.len();

        Ok(BatchPrediction { predictions, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::training::{TrainEngine, TrainingConfig};
    use serde_json::json;
    use uuid::Uuid;

    fn engine() -> InferenceEngine {
        let headers = vec!["age".to_string(), "plan".to_string(), "churn".to_string()];
        let rows: Vec<Row> = (0..40)
            .map(|i| {
                let age = 20 + i;
                let mut row = Row::new();
                row.insert("age".to_string(), json!(age));
                row.insert(
                    "plan".to_string(),
                    json!(if i % 2 == 0 { "basic" } else { "pro" }),
                );
                row.insert("churn".to_string(), json!(if age > 40 { 1 } else { 0 }));
                row
            })
            .collect();
        let dataset = Dataset::new(headers, rows).unwrap();
        let config = TrainingConfig::new("churn", vec!["age".to_string(), "plan".to_string()])
            .with_seed(42)
            .with_n_estimators(15);
        let outcome = TrainEngine::new(config).train(&dataset).unwrap();
        let artifact = ModelArtifact::from_outcome(outcome, Uuid::new_v4(), "test");
        InferenceEngine::new(artifact).unwrap()
    }

    fn record(age: i64, plan: &str) -> Row {
        let mut row = Row::new();
        row.insert("age".to_string(), json!(age));
        row.insert("plan".to_string(), json!(plan));
        row
    }

    #[test]
    fn test_predict_one_valid_result() {
        let engine = engine();
        let result = engine.predict_one(&record(55, "basic")).unwrap();
        assert!((0.0..=1.0).contains(&result.churn_probability));
        assert!(result.prediction == 0 || result.prediction == 1);
        assert_eq!(result.feature_contributions.len(), 2);
    }

    #[test]
    fn test_unseen_category_defaults_to_zero() {
        let engine = engine();
        // "enterprise" was never seen in training
        let vector = engine.encode_record(&record(30, "enterprise"));
        assert_eq!(vector[1], 0.0);
        // And prediction still succeeds
        assert!(engine.predict_one(&record(30, "enterprise")).is_ok());
    }

    #[test]
    fn test_missing_values_default_to_zero() {
        let engine = engine();
        let empty = Row::new();
        let vector = engine.encode_record(&empty);
        assert_eq!(vector, vec![0.0, 0.0]);
    }

    #[test]
    fn test_numeric_string_coerces_at_inference() {
        let engine = engine();
        let mut row = Row::new();
        row.insert("age".to_string(), json!("55"));
        row.insert("plan".to_string(), json!("pro"));
        let vector = engine.encode_record(&row);
        assert_eq!(vector[0], 55.0);
    }

    #[test]
    fn test_prediction_is_pure() {
        let engine = engine();
        let row = record(62, "pro");
        let a = engine.predict_one(&row).unwrap();
        let b = engine.predict_one(&row).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_contribution_sign_follows_prediction() {
        let engine = engine();
        let result = engine.predict_one(&record(62, "pro")).unwrap();
        let direction: f64 = if result.prediction == 1 { 1.0 } else { -1.0 };
        let age_importance = engine.artifact().feature_importance["age"];
        let expected = age_importance * (62.0 - 0.5) * direction;
        assert!((result.feature_contributions["age"] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_batch_cap_enforced() {
        let engine = engine();
        let rows: Vec<Row> = (0..MAX_BATCH_SIZE + 1).map(|i| record(i as i64, "basic")).collect();
        assert!(matches!(
            engine.predict_batch(&rows),
            Err(ChurnError::BatchLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_batch_matches_single_predictions() {
        let engine = engine();
        let rows = vec![record(25, "basic"), record(62, "pro")];
        let batch = engine.predict_batch(&rows).unwrap();
        assert_eq!(batch.total, 2);
        for (row, result) in rows.iter().zip(batch.predictions.iter()) {
            assert_eq!(engine.predict_one(row).unwrap(), *result);
        }
    }
}
