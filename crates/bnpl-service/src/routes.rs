//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{debt, health, plans, refunds, users, webhooks};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check with ledger counts
///
/// ## Users
/// - `GET /v1/users`, `POST /v1/users` - List / register users
/// - `GET /v1/users/:user_id` - Masked user profile
///
/// ## Plans (idempotent creation)
/// - `GET /v1/plans`, `POST /v1/plans` - List / open plans
/// - `GET /v1/plans/:plan_id`, `DELETE /v1/plans/:plan_id`
///
/// ## Debt (idempotent repayment)
/// - `GET /v1/debt/:user_id` - Overdue summary
/// - `POST /v1/debt/:user_id` - Repay overdue installments
///
/// ## Refunds
/// - `GET /v1/refunds`, `POST /v1/refunds` - List / request refunds
/// - `GET /v1/refunds/:refund_id`
/// - `POST /v1/refunds/:refund_id/approve` - Approve or reject
/// - `POST /v1/refunds/:refund_id/cancel`
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/refunds` - Merchant refund status
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:user_id", get(users::get_user))
        // Plans
        .route("/plans", get(plans::list_plans).post(plans::create_plan))
        .route(
            "/plans/:plan_id",
            get(plans::get_plan).delete(plans::delete_plan),
        )
        // Debt
        .route("/debt/:user_id", get(debt::check_debt).post(debt::repay))
        // Refunds
        .route(
            "/refunds",
            get(refunds::list_refunds).post(refunds::create_refund),
        )
        .route("/refunds/:refund_id", get(refunds::get_refund))
        .route("/refunds/:refund_id/approve", post(refunds::decide_refund))
        .route("/refunds/:refund_id/cancel", post(refunds::cancel_refund))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Webhooks (no rate limit - controlled by merchants)
        .route("/webhooks/refunds", post(webhooks::refund_webhook))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
