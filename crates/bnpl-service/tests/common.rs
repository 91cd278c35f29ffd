//! Common test utilities for BNPL service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use bnpl_core::ManualClock;
use bnpl_engine::Ledger;
use bnpl_service::{create_router, AppState, ServiceConfig};
use bnpl_store::MemoryStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The ledger behind the server, for driving the sweep directly.
    pub ledger: Arc<Ledger>,
    /// The ledger's clock; advance it to simulate time passing.
    pub clock: Arc<ManualClock>,
    /// The store behind the ledger, for inspecting raw rows.
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a harness that verifies webhook signatures with `secret`.
    pub fn with_webhook_secret(secret: &str) -> Self {
        Self::with_config(ServiceConfig {
            webhook_secret: Some(secret.to_string()),
            ..test_config()
        })
    }

    fn with_config(config: ServiceConfig) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(Ledger::new(
            store.clone(),
            clock.clone(),
            config.ledger_config(),
        ));

        let state = AppState::new(Arc::clone(&ledger), config);
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            ledger,
            clock,
            store,
        }
    }

    /// Register a user through the API.
    pub async fn register(&self, user_id: &str) -> Value {
        let response = self.server.post("/v1/users").json(&user_body(user_id)).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Open a plan through the API without an idempotency key.
    pub async fn create_plan(&self, user_id: &str, total: &str, count: u32) -> Value {
        let response = self
            .server
            .post("/v1/plans")
            .json(&json!({
                "user_id": user_id,
                "total_amount": total,
                "installment_count": count,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Request a refund through the API.
    pub async fn create_refund(&self, user_id: &str, transaction_id: &str, amount: &str) -> Value {
        let response = self
            .server
            .post("/v1/refunds")
            .json(&json!({
                "user_id": user_id,
                "transaction_id": transaction_id,
                "amount": amount,
                "reason": "Product defect",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Advance the clock past the first due date and run the sweep.
    pub fn make_first_installment_overdue(&self) {
        self.clock.advance_days(31);
        self.ledger.sweep_overdue().expect("sweep");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration with production defaults and no webhook secret.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        webhook_secret: None,
        ..ServiceConfig::default()
    }
}

/// Registration body for `user_id`.
pub fn user_body(user_id: &str) -> Value {
    json!({
        "user_id": user_id,
        "full_name": "John Doe",
        "phone_number": "+998901234567",
        "passport_number": "AA1234567",
        "date_of_birth": "1990-05-20",
        "card_number": "4111111111111111",
    })
}

/// IDs of a plan's installments, in sequence order.
pub fn installment_ids(plan: &Value) -> Vec<String> {
    plan["installments"]
        .as_array()
        .expect("installments array")
        .iter()
        .map(|i| i["id"].as_str().expect("installment id").to_string())
        .collect()
}
