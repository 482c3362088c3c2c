//! Error Handling
//!
//! Unified error types for the server.
//! Uses thiserror for ergonomic error definitions and maps every variant to
//! an HTTP status and a stable machine-readable code.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use plant_health_core::CoreError;
use plant_health_vision::VisionError;

use crate::models::response::ErrorBody;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed upload or request body
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body over the configured upload limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Remote diagnosis call failed or returned unusable data
    #[error("Inference unavailable: {0}")]
    InferenceUnavailable(String),

    /// Persistence layer unreachable
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// SQLite errors (auto-converted from rusqlite::Error)
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::InferenceUnavailable(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable code exposed in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::PayloadTooLarge(_) => "VALIDATION_ERROR",
            AppError::InferenceUnavailable(_) => "INFERENCE_UNAVAILABLE",
            AppError::StoreUnavailable(_) | AppError::Sqlite(_) => "STORE_UNAVAILABLE",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// HTTP status used when this error ends a request.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InferenceUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::StoreUnavailable(_) | AppError::Sqlite(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{detail, code}` body for this error.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            detail: self.to_string(),
            code: self.code().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("[Http] {} {}", status.as_u16(), self);
        } else {
            tracing::debug!("[Http] {} {}", status.as_u16(), self);
        }
        (status, Json(self.body())).into_response()
    }
}

impl AppError {
    /// Map an axum extractor rejection, keeping 413 distinct.
    fn from_rejection(status: StatusCode, body_text: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(body_text)
        } else {
            AppError::Validation(body_text)
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::from_rejection(err.status(), err.body_text())
    }
}

impl From<VisionError> for AppError {
    fn from(err: VisionError) -> Self {
        AppError::InferenceUnavailable(err.to_string())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => AppError::Io(e),
            CoreError::Serialization(e) => AppError::Serialization(e),
            CoreError::Validation(msg) => AppError::Config(msg),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::StoreUnavailable(format!("Failed to get connection: {}", err))
    }
}
