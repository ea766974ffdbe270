//! Error types for the cross-validation engine

use thiserror::Error;

/// Result type alias for cross-validation operations
pub type Result<T> = std::result::Result<T, CvError>;

/// Main error type
///
/// Undefined metrics (AUC on a single-class test fold) are not errors; they
/// are carried as `None` and dropped during aggregation.
#[derive(Error, Debug)]
pub enum CvError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Fit error: {0}")]
    FitError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CvError {
    /// True for the data-shape family (length mismatches, missing classes).
    pub fn is_shape_error(&self) -> bool {
        matches!(self, CvError::ShapeError { .. } | CvError::DataError(_))
    }
}

impl From<polars::error::PolarsError> for CvError {
    fn from(err: polars::error::PolarsError) -> Self {
        CvError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CvError {
    fn from(err: serde_json::Error) -> Self {
        CvError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CvError {
    fn from(err: ndarray::ShapeError) -> Self {
        CvError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
