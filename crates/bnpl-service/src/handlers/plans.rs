//! Installment plan handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use bnpl_core::{Amount, PlanId, UserId, DEFAULT_INSTALLMENT_COUNT};
use bnpl_engine::PlanDetails;

use crate::error::ApiError;
use crate::handlers::{idempotency_key, outcome_response, ApiJson, ApiQuery};
use crate::state::AppState;

/// Create plan request.
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    /// The borrowing user.
    pub user_id: UserId,
    /// Purchase amount to split.
    pub total_amount: Amount,
    /// Number of installments (default 3).
    #[serde(default = "default_installment_count")]
    pub installment_count: u32,
}

const fn default_installment_count() -> u32 {
    DEFAULT_INSTALLMENT_COUNT
}

/// Plan list filter.
#[derive(Debug, Deserialize)]
pub struct PlanListQuery {
    /// Only plans of this user.
    pub user_id: Option<UserId>,
}

/// Plan list response.
#[derive(Debug, Serialize)]
pub struct PlansResponse {
    /// Plans newest first, each with its installments.
    pub plans: Vec<PlanDetails>,
}

/// Open a new installment plan.
///
/// Honors `X-Idempotency-Key`.
pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<CreatePlanRequest>,
) -> Result<Response, ApiError> {
    let key = idempotency_key(&headers)?;
    let outcome = state.ledger.create_plan(
        &body.user_id,
        body.total_amount,
        body.installment_count,
        key.as_deref(),
    )?;
    Ok(outcome_response(outcome))
}

/// List plans, optionally filtered by `?user_id=`.
pub async fn list_plans(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<PlanListQuery>,
) -> Result<Json<PlansResponse>, ApiError> {
    let plans = state.ledger.list_plans(query.user_id.as_ref())?;
    Ok(Json(PlansResponse { plans }))
}

/// Get one plan with its installments.
pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanDetails>, ApiError> {
    let plan_id: PlanId = plan_id.parse()?;
    Ok(Json(state.ledger.get_plan(&plan_id)?))
}

/// Delete a plan and its installments.
pub async fn delete_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let plan_id: PlanId = plan_id.parse()?;
    state.ledger.delete_plan(&plan_id)?;
    Ok(StatusCode::NO_CONTENT)
}
