//! Debt check and repayment handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use bnpl_core::{InstallmentId, UserId};
use bnpl_engine::DebtSummary;

use crate::error::ApiError;
use crate::handlers::{idempotency_key, outcome_response, ApiJson};
use crate::state::AppState;

/// Repayment request.
#[derive(Debug, Deserialize)]
pub struct RepaymentRequest {
    /// Overdue installments to pay.
    pub installment_ids: Vec<InstallmentId>,
}

/// Summarize a user's overdue debt.
pub async fn check_debt(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<DebtSummary>, ApiError> {
    let user_id: UserId = user_id.parse()?;
    Ok(Json(state.ledger.check_debt(&user_id)?))
}

/// Pay overdue installments.
///
/// Honors `X-Idempotency-Key`.
pub async fn repay(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<RepaymentRequest>,
) -> Result<Response, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let key = idempotency_key(&headers)?;
    let outcome = state
        .ledger
        .repay(&user_id, &body.installment_ids, key.as_deref())?;
    Ok(outcome_response(outcome))
}
