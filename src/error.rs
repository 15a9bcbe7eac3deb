//! Domain-specific error types for email-mentor

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Main error type for the email-mentor service
#[derive(Error, Debug)]
pub enum MentorError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("HTTP error: {message}")]
    Http { message: String },

    #[error("Unauthorized")]
    Unauthorized,
}

impl From<serde_json::Error> for MentorError {
    fn from(err: serde_json::Error) -> Self {
        MentorError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Convert MentorError to an HTTP response for the presentation boundary
impl IntoResponse for MentorError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            MentorError::Validation { message } => {
                (StatusCode::BAD_REQUEST, "validation_error", message)
            }
            MentorError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_string(),
            ),
            MentorError::Serialization { message } => {
                (StatusCode::BAD_REQUEST, "serialization_error", message)
            }
            other => {
                tracing::error!("request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({ "error": { "code": code, "message": message } })),
        )
            .into_response()
    }
}

/// Result type alias for email-mentor operations
pub type Result<T> = std::result::Result<T, MentorError>;
