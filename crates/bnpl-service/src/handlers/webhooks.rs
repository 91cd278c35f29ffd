//! Merchant refund webhook handler.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bnpl_core::{RefundId, RefundStatus, WebhookStatus};

use crate::crypto::verify_signature;
use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 of the raw body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Merchant webhook payload.
#[derive(Debug, Deserialize)]
pub struct RefundWebhook {
    /// Refund ID or merchant transaction ID.
    pub refund_id: Option<String>,
    /// One of `approved`, `rejected`, `processing`, `failed`.
    pub status: Option<String>,
    /// Merchant's own reference, recorded on rejections.
    #[serde(default)]
    pub merchant_reference: Option<String>,
    /// When the merchant emitted the event.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Human-readable summary.
    pub message: String,
    /// The refund the webhook resolved to.
    pub refund_id: RefundId,
    /// The status the merchant reported.
    pub status: WebhookStatus,
    /// The refund's status after the webhook.
    pub refund_status: RefundStatus,
    /// Whether the refund changed.
    pub changed: bool,
    /// When the webhook was processed.
    pub processed_at: DateTime<Utc>,
}

/// Handle a merchant refund status callback.
pub async fn refund_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.config.webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing webhook signature".into()))?;

        if !verify_signature(secret, &body, signature) {
            tracing::warn!("Invalid refund webhook signature");
            return Err(ApiError::Unauthorized("Invalid webhook signature".into()));
        }
    }

    let body = std::str::from_utf8(&body)
        .map_err(|e| ApiError::BadRequest(format!("Webhook body is not valid UTF-8: {e}")))?;
    let webhook: RefundWebhook =
        serde_json::from_str(body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (Some(reference), Some(status)) = (webhook.refund_id.as_deref(), webhook.status.as_deref())
    else {
        return Err(ApiError::BadRequest(
            "Missing required fields: refund_id and status".into(),
        ));
    };
    let status: WebhookStatus = status.parse()?;

    tracing::info!(
        reference,
        status = status.as_str(),
        merchant_reference = ?webhook.merchant_reference,
        timestamp = ?webhook.timestamp,
        "Received refund webhook"
    );

    let outcome = state
        .ledger
        .apply_webhook(reference, status, webhook.merchant_reference.as_deref())?;

    Ok(Json(WebhookResponse {
        message: "Webhook processed successfully".into(),
        refund_id: outcome.refund.id,
        status: outcome.webhook_status,
        refund_status: outcome.refund.status,
        changed: outcome.changed,
        processed_at: state.ledger.clock().now(),
    }))
}
