//! Common test utilities for ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use bnpl_core::{Amount, InstallmentId, ManualClock, NewUser, User, UserId};
use bnpl_engine::{Ledger, LedgerConfig, PlanDetails};
use bnpl_store::MemoryStore;

/// Test harness: a ledger over an in-memory store with a controllable clock.
pub struct TestHarness {
    /// The ledger under test.
    pub ledger: Arc<Ledger>,
    /// The clock the ledger reads; advance it to simulate time passing.
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    /// Create a ledger starting at 2025-01-01 12:00 UTC.
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let ledger = Ledger::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            LedgerConfig::default(),
        );
        Self {
            ledger: Arc::new(ledger),
            clock,
        }
    }

    /// Register a user with default profile fields.
    pub fn register(&self, user_id: &str) -> User {
        self.ledger
            .register_user(new_user(user_id))
            .expect("register user")
    }

    /// Create a plan without an idempotency key.
    pub fn plan(&self, user_id: &User, total: &str, count: u32) -> PlanDetails {
        self.ledger
            .create_plan(&user_id.user_id, amount(total), count, None)
            .expect("create plan")
            .into_inner()
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

/// Registration input for `user_id`.
pub fn new_user(user_id: &str) -> NewUser {
    NewUser {
        user_id: user_id.parse().unwrap(),
        full_name: "John Doe".into(),
        phone_number: "+12345678901".into(),
        passport_number: "AB1234567".into(),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
        card_number: Some("4111111111111111".into()),
    }
}

/// Parse an amount literal.
pub fn amount(text: &str) -> Amount {
    text.parse().unwrap()
}

/// Parse a user ID literal.
pub fn uid(text: &str) -> UserId {
    text.parse().unwrap()
}

/// IDs of the installments of a plan, in sequence order.
pub fn installment_ids(plan: &PlanDetails) -> Vec<InstallmentId> {
    plan.installments.iter().map(|i| i.id).collect()
}
