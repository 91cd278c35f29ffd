//! API handlers.

pub mod debt;
pub mod health;
pub mod plans;
pub mod refunds;
pub mod users;
pub mod webhooks;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use bnpl_core::IdempotencyRecord;
use bnpl_engine::Outcome;

use crate::error::ApiError;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Header set to `true` on responses replayed from the idempotency cache.
pub const REPLAYED_HEADER: &str = "x-idempotent-replay";

/// JSON body extractor that reports malformed input as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor that reports malformed input as [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Read the `X-Idempotency-Key` header, if present.
pub(crate) fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("X-Idempotency-Key must be visible ASCII".into()))?;
    IdempotencyRecord::validate_key(key)?;
    Ok(Some(key.to_string()))
}

/// `201 Created` for a fresh result, `200 OK` with a replay marker otherwise.
pub(crate) fn outcome_response<T: Serialize>(outcome: Outcome<T>) -> Response {
    match outcome {
        Outcome::Created(value) => (StatusCode::CREATED, Json(value)).into_response(),
        Outcome::Replayed(value) => (
            StatusCode::OK,
            [(REPLAYED_HEADER, "true")],
            Json(value),
        )
            .into_response(),
    }
}
