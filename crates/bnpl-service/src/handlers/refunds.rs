//! Refund workflow handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use bnpl_core::{Amount, Refund, RefundDecision, RefundId, UserId};

use crate::error::ApiError;
use crate::handlers::{outcome_response, ApiJson, ApiQuery};
use crate::state::AppState;

/// Create refund request.
#[derive(Debug, Deserialize)]
pub struct CreateRefundRequest {
    /// The customer asking for money back.
    pub user_id: UserId,
    /// Merchant transaction; doubles as the idempotency key.
    pub transaction_id: String,
    /// Amount to refund.
    pub amount: Amount,
    /// Customer-supplied reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Operator decision request.
#[derive(Debug, Deserialize)]
pub struct RefundDecisionRequest {
    /// `approve` or `reject`.
    pub action: RefundDecision,
    /// Rejection reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Refund list filter.
#[derive(Debug, Deserialize)]
pub struct RefundListQuery {
    /// Only refunds of this user.
    pub user_id: Option<UserId>,
}

/// Refund list response.
#[derive(Debug, Serialize)]
pub struct RefundsResponse {
    /// Refunds newest first.
    pub refunds: Vec<Refund>,
}

/// Request a refund.
///
/// A repeated `transaction_id` returns the existing refund with `200 OK`.
pub async fn create_refund(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<CreateRefundRequest>,
) -> Result<Response, ApiError> {
    let outcome = state.ledger.create_refund(
        &body.user_id,
        &body.transaction_id,
        body.amount,
        body.reason,
    )?;
    Ok(outcome_response(outcome))
}

/// List refunds, optionally filtered by `?user_id=`.
pub async fn list_refunds(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RefundListQuery>,
) -> Result<Json<RefundsResponse>, ApiError> {
    let refunds = state.ledger.list_refunds(query.user_id.as_ref())?;
    Ok(Json(RefundsResponse { refunds }))
}

/// Get one refund.
pub async fn get_refund(
    State(state): State<Arc<AppState>>,
    Path(refund_id): Path<String>,
) -> Result<Json<Refund>, ApiError> {
    let refund_id: RefundId = refund_id.parse()?;
    Ok(Json(state.ledger.get_refund(&refund_id)?))
}

/// Approve or reject a pending refund.
pub async fn decide_refund(
    State(state): State<Arc<AppState>>,
    Path(refund_id): Path<String>,
    ApiJson(body): ApiJson<RefundDecisionRequest>,
) -> Result<Json<Refund>, ApiError> {
    let refund_id: RefundId = refund_id.parse()?;
    let refund = state
        .ledger
        .approve_or_reject(&refund_id, body.action, body.reason.as_deref())?;
    Ok(Json(refund))
}

/// Cancel a pending refund.
pub async fn cancel_refund(
    State(state): State<Arc<AppState>>,
    Path(refund_id): Path<String>,
) -> Result<Json<Refund>, ApiError> {
    let refund_id: RefundId = refund_id.parse()?;
    Ok(Json(state.ledger.cancel_refund(&refund_id)?))
}
