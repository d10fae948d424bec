//! Model artifact
//!
//! The unit of persistence and the contract between training and serving.
//! An artifact is immutable once created; retraining produces a new artifact
//! with a new id. Storage itself is delegated to the caller's record store.

use crate::error::{ChurnError, Result};
use crate::evaluation::ModelMetrics;
use crate::preprocessing::EncodingMap;
use crate::training::{Algorithm, Classifier, TrainingOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A persisted, versioned trained model plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Target column the model predicts
    pub target_variable: String,
    /// Feature columns in the exact order used for training and inference
    pub features: Vec<String>,
    /// Algorithm that actually produced the model
    pub algorithm: Algorithm,
    /// Performance snapshot captured at training time, never recomputed
    pub performance: ModelMetrics,
    /// Normalized importance per feature
    pub feature_importance: BTreeMap<String, f64>,
    /// Categorical value -> code lookup, fixed at training time
    pub encoding_map: EncodingMap,
    /// Serialized model, opaque to storage
    pub model_json: String,
}

impl ModelArtifact {
    /// Build an artifact from a completed training run.
    pub fn from_outcome(outcome: TrainingOutcome, org_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            org_id,
            name: name.into(),
            created_at: Utc::now(),
            target_variable: outcome.target_variable,
            features: outcome.features,
            algorithm: outcome.algorithm,
            performance: outcome.metrics,
            feature_importance: outcome.feature_importance,
            encoding_map: outcome.encoding_map,
            model_json: outcome.model_json,
        }
    }

    /// Deserialize the stored model and check it agrees with the artifact's
    /// feature list.
    pub fn load_model(&self) -> Result<Classifier> {
        let model = Classifier::from_json(&self.model_json)?;
        if model.n_features() != self.features.len() {
            return Err(ChurnError::InferenceError(format!(
                "stored model expects {} features but the artifact lists {}",
                model.n_features(),
                self.features.len()
            )));
        }
        if model.algorithm() != self.algorithm {
            return Err(ChurnError::InferenceError(format!(
                "artifact is labeled {} but the stored model is {}",
                self.algorithm,
                model.algorithm()
            )));
        }
        Ok(model)
    }
}
