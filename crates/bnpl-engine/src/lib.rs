//! Ledger engine for the BNPL service.
//!
//! [`Ledger`] owns the business rules that sit between the HTTP surface and
//! storage:
//!
//! - **Idempotency cache**: replay of previously computed responses
//! - **Debt state machine**: plan creation, debt checks, repayment
//! - **Overdue sweep**: periodic reconciliation of past-due installments
//! - **Refund workflow**: operator decisions, cancellation, merchant webhooks
//!
//! Every mutation runs inside one [`bnpl_store::UnitOfWork`]. Rows are locked
//! in a fixed order (idempotency or transaction key, then user, then plan,
//! then installments) so that concurrent units never wait on each other in a
//! cycle.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod debt;
mod idempotency;
pub mod model;
mod plans;
mod refunds;
mod stats;
mod sweep;
mod users;

use std::sync::Arc;

use bnpl_core::{Clock, DEFAULT_IDEMPOTENCY_TTL_HOURS, DEFAULT_INSTALLMENT_INTERVAL_DAYS};
use bnpl_store::Store;

pub use model::{
    DebtSummary, LedgerStats, Outcome, PlanDetails, RepaymentReceipt, SweepReport, WebhookOutcome,
};

/// Tunables of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerConfig {
    /// How long cached idempotent responses are replayed.
    pub idempotency_ttl: chrono::Duration,
    /// Days between consecutive installment due dates.
    pub installment_interval_days: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            idempotency_ttl: chrono::Duration::hours(DEFAULT_IDEMPOTENCY_TTL_HOURS),
            installment_interval_days: DEFAULT_INSTALLMENT_INTERVAL_DAYS,
        }
    }
}

/// The BNPL ledger.
///
/// Cheap to share behind an `Arc`; all state lives in the store.
pub struct Ledger {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl Ledger {
    /// Create a ledger over `store`, reading time from `clock`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// The ledger configuration.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The clock every transition is stamped with.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
