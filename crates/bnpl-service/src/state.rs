//! Application state.

use std::sync::Arc;

use bnpl_engine::Ledger;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger every handler delegates to.
    pub ledger: Arc<Ledger>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(ledger: Arc<Ledger>, config: ServiceConfig) -> Self {
        if config.webhook_secret.is_none() {
            tracing::warn!("Webhook secret not configured - merchant webhooks are not verified");
        }

        Self { ledger, config }
    }

    /// Check if webhook signatures are verified.
    #[must_use]
    pub fn verifies_webhooks(&self) -> bool {
        self.config.webhook_secret.is_some()
    }
}
