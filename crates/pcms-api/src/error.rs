//! # Application Error Types
//!
//! Maps domain errors to HTTP status codes and a uniform JSON body:
//!
//! ```json
//! {"error": {"code": "NOT_FOUND", "message": "section ... not found"}}
//! ```
//!
//! Internal and unavailable failures never expose their detail to the
//! client; it goes to the log instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use pcms_core::ValidationError;
use pcms_preview::TokenRejection;
use pcms_schema::SchemaDefinitionError;
use pcms_state::{LifecycleError, StoreError};

/// Error envelope returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `NOT_FOUND`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

/// Client-facing message for every 503; the cause is only logged.
pub const UNAVAILABLE_MESSAGE: &str = "section store unavailable";

/// Errors returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// A body that is not JSON at all.
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Status code and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    /// The single rejection shown for every invalid preview token.
    pub fn preview_denied() -> Self {
        Self::Unauthorized("preview token invalid".to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                "An internal error occurred".to_string()
            }
            Self::ServiceUnavailable(detail) => {
                tracing::warn!(error = %detail, "service unavailable");
                UNAVAILABLE_MESSAGE.to_string()
            }
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Conflict(msg) => msg.clone(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            StoreError::RevisionConflict { .. }
            | StoreError::AlreadyExists(_)
            | StoreError::DuplicateKey { .. } => Self::Conflict(err.to_string()),
            StoreError::Unavailable(_) => Self::ServiceUnavailable(err.to_string()),
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(_) => Self::NotFound(err.to_string()),
            LifecycleError::Store(store) => store.into(),
            LifecycleError::Digest(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<SchemaDefinitionError> for AppError {
    fn from(err: SchemaDefinitionError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TokenRejection> for AppError {
    fn from(_: TokenRejection) -> Self {
        Self::preview_denied()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::ServiceUnavailable(err.to_string())
    }
}
