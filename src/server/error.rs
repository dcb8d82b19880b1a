//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::data::CORE_HOUSE_FEATURES;
use crate::error::RealtyError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("{message}")]
    MissingFeatures { message: String, missing: Vec<String> },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RealtyError> for ServerError {
    fn from(err: RealtyError) -> Self {
        match err {
            RealtyError::MissingFields(missing) => ServerError::MissingFeatures {
                message: RealtyError::MissingFields(missing.clone()).to_string(),
                missing,
            },
            err if err.is_client_error() => ServerError::BadRequest(err.to_string()),
            err => ServerError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServerError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": true, "message": message }),
            ),
            ServerError::MissingFeatures { message, missing } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": true,
                    "message": message,
                    "missing_fields": missing,
                    "required_features": CORE_HOUSE_FEATURES,
                }),
            ),
            ServerError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": true, "message": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let err: ServerError = RealtyError::ZipcodeNotFound("12345".into()).into();
        assert!(matches!(err, ServerError::BadRequest(ref m) if m.contains("12345")));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_hide_detail() {
        let err: ServerError = RealtyError::ModelNotFitted.into();
        assert!(matches!(err, ServerError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_fields_keep_list() {
        let err: ServerError = RealtyError::MissingFields(vec!["floors".into()]).into();
        match err {
            ServerError::MissingFeatures { message, missing } => {
                assert_eq!(message, "Missing required features: floors");
                assert_eq!(missing, vec!["floors".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
