//! Error types for the ChurnGuard core

use thiserror::Error;

/// Result type alias for ChurnGuard operations
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Main error type for the ChurnGuard core
#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Batch size {got} exceeds the limit of {max} rows per call")]
    BatchLimitExceeded { got: usize, max: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for ChurnError {
    fn from(err: serde_json::Error) -> Self {
        ChurnError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ChurnError {
    fn from(err: ndarray::ShapeError) -> Self {
        ChurnError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<csv::Error> for ChurnError {
    fn from(err: csv::Error) -> Self {
        ChurnError::DataError(err.to_string())
    }
}
