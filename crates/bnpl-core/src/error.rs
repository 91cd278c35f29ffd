//! Error types for the BNPL ledger.

use crate::amount::AmountError;
use crate::ids::IdError;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, BnplError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum BnplError {
    /// A user, plan, installment or refund does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record that was looked up.
        entity: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    /// The request is malformed or references records in the wrong state.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The user has overdue debt and may not open a new plan.
    #[error("user {user_id} has DEBT_USER status and cannot create new BNPL plans")]
    IneligibleUser {
        /// The rejected user.
        user_id: String,
    },

    /// A refund with this transaction id already exists.
    #[error("duplicate transaction: {transaction_id}")]
    DuplicateTransaction {
        /// The business key that collided.
        transaction_id: String,
    },

    /// The requested transition is not allowed from the current status.
    #[error("cannot move {entity} {id} from {from} to {to}")]
    InvalidState {
        /// The kind of record.
        entity: &'static str,
        /// The record identifier.
        id: String,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Invalid amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Storage failure; the unit of work was rolled back.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization of a cached response failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BnplError {
    /// Shorthand for a missing user.
    #[must_use]
    pub fn user_not_found(user_id: impl ToString) -> Self {
        Self::NotFound {
            entity: "user",
            id: user_id.to_string(),
        }
    }

    /// Shorthand for a missing plan.
    #[must_use]
    pub fn plan_not_found(plan_id: impl ToString) -> Self {
        Self::NotFound {
            entity: "plan",
            id: plan_id.to_string(),
        }
    }

    /// Shorthand for a missing refund.
    #[must_use]
    pub fn refund_not_found(reference: impl ToString) -> Self {
        Self::NotFound {
            entity: "refund",
            id: reference.to_string(),
        }
    }

    /// Whether the error means the caller asked for something that doesn't exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for BnplError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
