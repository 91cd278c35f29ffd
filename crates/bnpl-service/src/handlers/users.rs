//! User registry handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use bnpl_core::{MaskedUser, NewUser, UserId};

use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::state::AppState;

/// User list response.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    /// Users ordered by ID, sensitive fields masked.
    pub users: Vec<MaskedUser>,
}

/// Register a new user.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<MaskedUser>), ApiError> {
    let user = state.ledger.register_user(body)?;
    Ok((StatusCode::CREATED, Json(user.masked())))
}

/// List all users.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = state
        .ledger
        .list_users()?
        .iter()
        .map(MaskedUser::from)
        .collect();
    Ok(Json(UsersResponse { users }))
}

/// Get one user.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<MaskedUser>, ApiError> {
    let user_id: UserId = user_id.parse()?;
    let user = state.ledger.get_user(&user_id)?;
    Ok(Json(user.masked()))
}
