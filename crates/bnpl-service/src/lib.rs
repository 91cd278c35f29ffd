//! BNPL HTTP API Service.
//!
//! This crate provides the HTTP API over [`bnpl_engine::Ledger`], including:
//!
//! - User registration with masked profile views
//! - Installment plans, debt checks and repayments
//! - Refund requests, operator decisions and merchant webhooks
//! - A periodic scheduler for the overdue sweep and idempotency cleanup
//!
//! # Idempotency
//!
//! `POST /v1/plans` and `POST /v1/debt/:user_id` accept an
//! `X-Idempotency-Key` header. A repeated request with the same key replays
//! the first response with status `200 OK` instead of `201 Created`. Refund
//! requests use their `transaction_id` the same way.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers call the synchronous ledger

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod scheduler;
pub mod seed;
pub mod state;

pub use config::{ServiceConfig, StorageBackend};
pub use error::ApiError;
pub use routes::create_router;
pub use scheduler::{Scheduler, SchedulerHandle};
pub use state::AppState;
