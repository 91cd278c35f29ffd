//! Refund types.
//!
//! ```text
//! PENDING --approve / webhook approved--------------> APPROVED
//! PENDING --reject / cancel / webhook rejected|failed--> REJECTED
//! ```
//!
//! `APPROVED` and `REJECTED` are terminal. `COMPLETED` exists in the status
//! taxonomy for settlement reporting but no transition produces it.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, BnplError, RefundId, Result, UserId};

/// Reason recorded when the customer cancels a pending refund.
pub const CANCELLED_REASON: &str = "Cancelled by user";

/// Status of a refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    /// Awaiting a decision.
    Pending,
    /// Accepted by the merchant or an operator.
    Approved,
    /// Declined, failed, or cancelled.
    Rejected,
    /// Settled.
    Completed,
}

impl RefundStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Completed => "COMPLETED",
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator decision on a pending refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundDecision {
    /// Approve the refund.
    Approve,
    /// Reject the refund.
    Reject,
}

/// Refund status reported by a merchant webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookStatus {
    /// The merchant approved the refund.
    Approved,
    /// The merchant rejected the refund.
    Rejected,
    /// The merchant is still working on it.
    Processing,
    /// The refund failed on the merchant side.
    Failed,
}

impl WebhookStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processing => "processing",
            Self::Failed => "failed",
        }
    }

    /// The refund status this webhook maps onto.
    #[must_use]
    pub const fn target(self) -> RefundStatus {
        match self {
            Self::Approved => RefundStatus::Approved,
            Self::Rejected | Self::Failed => RefundStatus::Rejected,
            Self::Processing => RefundStatus::Pending,
        }
    }
}

impl FromStr for WebhookStatus {
    type Err = BnplError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "processing" => Ok(Self::Processing),
            "failed" => Ok(Self::Failed),
            other => Err(BnplError::Validation(format!(
                "invalid status {other:?}; must be one of: approved, rejected, processing, failed"
            ))),
        }
    }
}

/// A refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    /// Refund identifier.
    pub id: RefundId,
    /// Requesting user.
    pub user_id: UserId,
    /// Merchant transaction being refunded; unique.
    pub transaction_id: String,
    /// Amount to refund.
    pub amount: Amount,
    /// Refund status.
    pub status: RefundStatus,
    /// Free-text reason, annotated on rejection and cancellation.
    pub reason: String,
    /// Last merchant reference received by webhook.
    pub merchant_reference: Option<String>,
    /// When the refund reached a terminal status.
    pub processed_at: Option<DateTime<Utc>>,
    /// When the refund was requested.
    pub created_at: DateTime<Utc>,
    /// When the refund was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    /// Create a pending refund.
    #[must_use]
    pub fn new(
        user_id: UserId,
        transaction_id: String,
        amount: Amount,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RefundId::generate(),
            user_id,
            transaction_id,
            amount,
            status: RefundStatus::Pending,
            reason: reason.unwrap_or_default(),
            merchant_reference: None,
            processed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an operator decision.
    ///
    /// A rejection overwrites `reason` with `"Rejected: <reason>"`, or just
    /// `"Rejected"` when no reason is given.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the refund is pending.
    pub fn decide(
        &mut self,
        decision: RefundDecision,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        match decision {
            RefundDecision::Approve => self.finish(RefundStatus::Approved, None, now),
            RefundDecision::Reject => {
                let annotation = match reason.map(str::trim).filter(|r| !r.is_empty()) {
                    Some(reason) => format!("Rejected: {reason}"),
                    None => "Rejected".to_string(),
                };
                self.finish(RefundStatus::Rejected, Some(annotation), now)
            }
        }
    }

    /// Cancel a pending refund on the customer's behalf.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the refund is pending.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.finish(RefundStatus::Rejected, Some(CANCELLED_REASON.to_string()), now)
    }

    /// Apply a merchant webhook.
    ///
    /// Returns `true` if the refund changed. `processing` never changes the
    /// refund, and a redelivered webhook whose status the refund already has
    /// is accepted without effect.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the webhook contradicts a terminal status.
    pub fn apply_webhook(
        &mut self,
        status: WebhookStatus,
        merchant_reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let target = status.target();
        if status == WebhookStatus::Processing || self.status == target {
            return Ok(false);
        }

        let reference = merchant_reference.unwrap_or("No reference");
        let annotation = match status {
            WebhookStatus::Rejected => Some(format!("Rejected via webhook: {reference}")),
            WebhookStatus::Failed => Some(format!("Failed via webhook: {reference}")),
            WebhookStatus::Approved | WebhookStatus::Processing => None,
        };
        self.finish(target, annotation, now)?;
        if let Some(reference) = merchant_reference {
            self.merchant_reference = Some(reference.to_string());
        }
        Ok(true)
    }

    fn finish(
        &mut self,
        target: RefundStatus,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.status != RefundStatus::Pending {
            return Err(BnplError::InvalidState {
                entity: "refund",
                id: self.id.to_string(),
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        if let Some(reason) = reason {
            self.reason = reason;
        }
        self.processed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}
