//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use bnpl_engine::LedgerStats;

use crate::error::ApiError;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Ledger counts by status.
    pub stats: LedgerStats,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = state.ledger.stats()?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        service: "bnpl".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        stats,
    }))
}
