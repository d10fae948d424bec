//! ChurnGuard Core - Churn prediction training and inference pipeline
//!
//! This crate is the algorithmic core behind a churn-prediction product:
//! it takes an uploaded customer dataset plus a training configuration and
//! produces metrics, a feature-importance map, and a serialized model
//! artifact ready for stateless serving.
//!
//! # Modules
//!
//! ## Data
//! - [`dataset`] - Tabular dataset model, column statistics, CSV loading
//! - [`preprocessing`] - Imputation, categorical encoding, train/test split
//!
//! ## Modeling
//! - [`training`] - Random forest and gradient boosting trainers
//! - [`evaluation`] - Confusion matrix and derived metrics
//! - [`importance`] - Native and permutation feature importance
//!
//! ## Serving
//! - [`artifact`] - Persisted model artifact contract
//! - [`inference`] - Single and batch prediction from a stored artifact
//!
//! ## Infrastructure
//! - [`worker`] - Background training jobs with progress events

// Core error handling
pub mod error;

// Data
pub mod dataset;
pub mod preprocessing;

// Modeling
pub mod training;
pub mod evaluation;
pub mod importance;

// Serving
pub mod artifact;
pub mod inference;

// Infrastructure
pub mod worker;

pub use error::{ChurnError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ChurnError, Result};

    // Data
    pub use crate::dataset::{dataset_stats, ColumnStats, ColumnType, Dataset, Row};
    pub use crate::preprocessing::{preprocess, train_test_split, EncodingMap, Preprocessed};

    // Training
    pub use crate::training::{
        Algorithm, Classifier, GbdtClassifier, RandomForestClassifier, TrainEngine,
        TrainingConfig, TrainingOutcome, TrainingPhase,
    };

    // Evaluation and importance
    pub use crate::evaluation::{evaluate, ConfusionMatrix, ModelMetrics};
    pub use crate::importance::{normalize_importance, uniform_importance, PermutationImportance};

    // Serving
    pub use crate::artifact::ModelArtifact;
    pub use crate::inference::{
        BatchPrediction, InferenceEngine, PredictionResult, MAX_BATCH_SIZE,
    };

    // Jobs
    pub use crate::worker::{JobEvent, JobHandle, TrainingJob};
}
