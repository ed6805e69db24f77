//! HTTP-facing error type and flash messages shared by the services

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
pub use axum_extra::extract::WithRejection;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::error::DatabaseError;

/// Error type returned by request handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// No (valid) credentials were presented
    #[error("Unauthorized")]
    Unauthorized,

    /// Login with an unknown username or a wrong password
    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// Authenticated, but not allowed to act on the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing entity
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate entity
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password.".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) | ApiError::Database(DatabaseError::Conflict(msg)) => {
                (StatusCode::CONFLICT, msg)
            }
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

/// JSON request body whose rejection is reported as a `400` in the `{"error"}` shape
pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// Severity of a flash message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Error,
}

/// One-shot message shown alongside a re-rendered view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub text: String,
}

impl Flash {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }
}
