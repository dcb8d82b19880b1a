//! Error types for the Sound Realty price estimator

use thiserror::Error;

/// Result type alias for estimator operations
pub type Result<T> = std::result::Result<T, RealtyError>;

/// Main error type for training and serving
#[derive(Error, Debug)]
pub enum RealtyError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Required column missing: {0}")]
    MissingColumn(String),

    #[error("Duplicate zipcode in demographics data: {0}")]
    DuplicateZipcode(String),

    #[error("Zipcode {0} not found in demographics data")]
    ZipcodeNotFound(String),

    #[error("Invalid zipcode: {0}")]
    InvalidZipcode(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing required features: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl RealtyError {
    /// Whether the failure was caused by the caller's input rather than the
    /// service itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RealtyError::ZipcodeNotFound(_)
                | RealtyError::InvalidZipcode(_)
                | RealtyError::MissingField(_)
                | RealtyError::MissingFields(_)
                | RealtyError::InvalidRequest(_)
        )
    }
}

impl From<polars::error::PolarsError> for RealtyError {
    fn from(err: polars::error::PolarsError) -> Self {
        RealtyError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for RealtyError {
    fn from(err: serde_json::Error) -> Self {
        RealtyError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for RealtyError {
    fn from(err: ndarray::ShapeError) -> Self {
        RealtyError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
