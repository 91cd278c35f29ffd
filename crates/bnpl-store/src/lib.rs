//! Transactional storage layer for the BNPL ledger.
//!
//! Every read and write of one ledger operation happens inside a single
//! [`UnitOfWork`] obtained from [`Store::begin`]. A unit either commits all of
//! its writes or, when dropped without [`UnitOfWork::commit`], none of them.
//!
//! # Backends
//!
//! - [`MemoryStore`]: tables behind one mutex held for the lifetime of the
//!   unit, so units are fully serialized. Used by tests and the default
//!   service configuration.
//! - `RocksStore` (feature `rocksdb-backend`): a `RocksDB` `TransactionDB`
//!   with column families per table plus secondary index families. Rows are
//!   locked with `get_for_update`, so concurrent units touching the same row
//!   serialize on that row.
//!
//! # Uniqueness
//!
//! Refund `transaction_id` and idempotency keys are unique. Inserting a
//! duplicate fails with [`StoreError::Conflict`].
//!
//! # Example
//!
//! ```
//! use bnpl_core::{NewUser, User};
//! use bnpl_store::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let user = User::new(
//!     NewUser {
//!         user_id: "usr-1".parse().unwrap(),
//!         full_name: "Ada Lovelace".into(),
//!         phone_number: "+15550100200".into(),
//!         passport_number: "AB1234567".into(),
//!         date_of_birth: chrono::NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
//!         card_number: None,
//!     },
//!     chrono::Utc::now(),
//! );
//!
//! let mut uow = store.begin().unwrap();
//! uow.put_user(&user).unwrap();
//! uow.commit().unwrap();
//!
//! let uow = store.begin().unwrap();
//! assert!(uow.get_user(&user.user_id).unwrap().is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;

#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use chrono::{DateTime, NaiveDate, Utc};

use bnpl_core::{
    IdempotencyRecord, Installment, InstallmentId, InstallmentStatus, Plan, PlanId, Refund,
    RefundId, User, UserId,
};

/// A storage backend able to open units of work.
pub trait Store: Send + Sync {
    /// Open a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start a transaction.
    fn begin(&self) -> Result<Box<dyn UnitOfWork + '_>>;
}

/// One atomic transaction over the ledger tables.
///
/// Reads observe the unit's own uncommitted writes. Lists are returned in a
/// deterministic order documented on each method.
pub trait UnitOfWork {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Get a user by ID, locking the row for the rest of the unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: &UserId) -> Result<Option<User>>;

    /// Insert or update a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_user(&mut self, user: &User) -> Result<()>;

    /// List all users, ordered by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_users(&self) -> Result<Vec<User>>;

    // =========================================================================
    // Plan Operations
    // =========================================================================

    /// Get a plan by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>>;

    /// Insert or update a plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_plan(&mut self, plan: &Plan) -> Result<()>;

    /// Delete a plan together with all of its installments.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the plan doesn't exist.
    fn delete_plan(&mut self, plan_id: &PlanId) -> Result<()>;

    /// List plans, optionally restricted to one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_plans(&self, user_id: Option<&UserId>) -> Result<Vec<Plan>>;

    // =========================================================================
    // Installment Operations
    // =========================================================================

    /// Get an installment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_installment(&self, installment_id: &InstallmentId) -> Result<Option<Installment>>;

    /// Insert or update an installment, maintaining the owner and due-date
    /// indexes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_installment(&mut self, installment: &Installment) -> Result<()>;

    /// List the installments of a plan, ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_installments_by_plan(&self, plan_id: &PlanId) -> Result<Vec<Installment>>;

    /// List a user's installments, optionally filtered by status, ordered by
    /// due date then sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_installments_by_user(
        &self,
        user_id: &UserId,
        status: Option<InstallmentStatus>,
    ) -> Result<Vec<Installment>>;

    /// List every `UPCOMING` installment with `due_date < before`, ordered by
    /// due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_upcoming_due_before(&self, before: NaiveDate) -> Result<Vec<Installment>>;

    // =========================================================================
    // Refund Operations
    // =========================================================================

    /// Get a refund by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_refund(&self, refund_id: &RefundId) -> Result<Option<Refund>>;

    /// Find a refund by its merchant transaction ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_refund_by_transaction(&self, transaction_id: &str) -> Result<Option<Refund>>;

    /// Insert a new refund.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if a refund with the same
    /// `transaction_id` exists.
    fn insert_refund(&mut self, refund: &Refund) -> Result<()>;

    /// Update an existing refund.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the refund doesn't exist.
    fn put_refund(&mut self, refund: &Refund) -> Result<()>;

    /// List refunds, optionally restricted to one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_refunds(&self, user_id: Option<&UserId>) -> Result<Vec<Refund>>;

    // =========================================================================
    // Idempotency Operations
    // =========================================================================

    /// Get an idempotency record by key, regardless of expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_idempotency(&self, key: &str) -> Result<Option<IdempotencyRecord>>;

    /// Insert an idempotency record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the key exists.
    fn insert_idempotency(&mut self, record: &IdempotencyRecord) -> Result<()>;

    /// Delete an idempotency record. Deleting a missing key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn delete_idempotency(&mut self, key: &str) -> Result<()>;

    /// Delete every record with `expires_at < now`, returning how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn purge_idempotency(&mut self, now: DateTime<Utc>) -> Result<usize>;

    // =========================================================================
    // Completion
    // =========================================================================

    /// Make every write of this unit durable and visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be committed; no write of
    /// the unit is applied in that case.
    fn commit(self: Box<Self>) -> Result<()>;
}
