//! API error types and responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use bnpl_core::{AmountError, BnplError, IdError};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid webhook signature.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden - the user may not perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<BnplError> for ApiError {
    fn from(err: BnplError) -> Self {
        match err {
            BnplError::NotFound { .. } => Self::NotFound(err.to_string()),
            BnplError::Validation(msg) => Self::BadRequest(msg),
            BnplError::InvalidId(_) | BnplError::InvalidAmount(_) => {
                Self::BadRequest(err.to_string())
            }
            BnplError::IneligibleUser { .. } => Self::Forbidden(err.to_string()),
            BnplError::InvalidState { .. } | BnplError::DuplicateTransaction { .. } => {
                Self::Conflict(err.to_string())
            }
            BnplError::Storage(msg) | BnplError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        Self::BadRequest(format!("invalid identifier: {err}"))
    }
}

impl From<AmountError> for ApiError {
    fn from(err: AmountError) -> Self {
        Self::BadRequest(format!("invalid amount: {err}"))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
