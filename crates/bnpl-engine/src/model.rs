//! Result types returned by ledger operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bnpl_core::{
    Amount, Installment, InstallmentId, Plan, PlanId, Refund, UserId, UserStatus, WebhookStatus,
};

/// Result of an idempotent mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The mutation executed now.
    Created(T),
    /// A previous result was replayed without executing again.
    Replayed(T),
}

impl<T> Outcome<T> {
    /// Whether this result was served from the cache.
    #[must_use]
    pub const fn is_replayed(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }

    /// Borrow the result.
    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Created(value) | Self::Replayed(value) => value,
        }
    }

    /// Take the result.
    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Created(value) | Self::Replayed(value) => value,
        }
    }
}

/// A cached result that belongs to one user.
pub(crate) trait UserScoped {
    fn owner(&self) -> &UserId;
}

impl UserScoped for PlanDetails {
    fn owner(&self) -> &UserId {
        &self.plan.user_id
    }
}

impl UserScoped for RepaymentReceipt {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

/// A plan together with its installments in sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetails {
    /// The plan.
    #[serde(flatten)]
    pub plan: Plan,
    /// Installments ordered by sequence.
    pub installments: Vec<Installment>,
}

/// A user's outstanding overdue debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSummary {
    /// The user.
    pub user_id: UserId,
    /// Whether any installment is overdue.
    pub has_overdue: bool,
    /// Exact sum of the overdue installments.
    pub total_debt: Amount,
    /// The overdue installments, oldest due date first.
    pub overdue_installments: Vec<Installment>,
    /// The user's current status.
    pub user_status: UserStatus,
}

/// Confirmation of a repayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentReceipt {
    /// Human-readable summary.
    pub message: String,
    /// The paying user.
    pub user_id: UserId,
    /// How many installments were paid.
    pub paid_installments: usize,
    /// The installments that were paid.
    pub installment_ids: Vec<InstallmentId>,
    /// Plans that became fully paid by this repayment.
    pub completed_plans: Vec<PlanId>,
    /// The user's status after the repayment.
    pub user_status: UserStatus,
    /// When the installments were marked paid.
    pub paid_at: DateTime<Utc>,
}

/// Summary of one overdue sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Installments moved from `UPCOMING` to `OVERDUE`.
    pub updated_count: usize,
    /// Users owning at least one newly overdue installment.
    pub affected_users: Vec<UserId>,
}

/// Result of applying a merchant webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookOutcome {
    /// The refund after the webhook.
    pub refund: Refund,
    /// The status the merchant reported.
    pub webhook_status: WebhookStatus,
    /// Whether the refund changed.
    pub changed: bool,
}

/// Aggregate counts surfaced by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Registered users.
    pub total_users: usize,
    /// Users with `NORMAL` status.
    pub normal_users: usize,
    /// Users with `DEBT_USER` status.
    pub debt_users: usize,
    /// Plans of any status.
    pub total_plans: usize,
    /// Plans still being repaid.
    pub active_plans: usize,
    /// Refunds of any status.
    pub total_refunds: usize,
    /// Refunds awaiting a decision.
    pub pending_refunds: usize,
}
