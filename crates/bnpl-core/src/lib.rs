//! Core types and state transitions for the BNPL ledger.
//!
//! This crate provides the foundational types used throughout the service:
//!
//! - **Identifiers**: `UserId`, `PlanId`, `InstallmentId`, `RefundId`
//! - **Money**: `Amount`, an exact two-decimal amount held in cents
//! - **Users**: `User`, `UserStatus`, `MaskedUser`
//! - **Plans**: `Plan`, `Installment` and the schedule builder
//! - **Refunds**: `Refund`, `RefundStatus`, `WebhookStatus`
//! - **Idempotency**: `IdempotencyRecord`
//! - **Time**: the `Clock` abstraction used by every state transition
//!
//! # Status rules
//!
//! Every status is a closed enum. Transitions go through methods that reject
//! invalid source/target pairs with `BnplError::InvalidState`; no status field
//! is assigned directly outside this crate's transition functions.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod amount;
pub mod clock;
pub mod error;
pub mod idempotency;
pub mod ids;
pub mod plan;
pub mod refund;
pub mod user;

pub use amount::{Amount, AmountError, MAX_AMOUNT_CENTS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BnplError, Result};
pub use idempotency::{IdempotencyRecord, DEFAULT_IDEMPOTENCY_TTL_HOURS, MAX_IDEMPOTENCY_KEY_LEN};
pub use ids::{IdError, InstallmentId, PlanId, RefundId, UserId};
pub use plan::{
    build_schedule, Installment, InstallmentStatus, Plan, PlanStatus, ScheduleEntry,
    DEFAULT_INSTALLMENT_COUNT, DEFAULT_INSTALLMENT_INTERVAL_DAYS, MAX_INSTALLMENT_COUNT,
    MIN_INSTALLMENT_COUNT,
};
pub use refund::{Refund, RefundDecision, RefundStatus, WebhookStatus, CANCELLED_REASON};
pub use user::{MaskedUser, NewUser, User, UserStatus};
