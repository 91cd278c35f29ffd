//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary user records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Plans, keyed by `plan_id`.
    pub const PLANS: &str = "plans";

    /// Index: plans by user, keyed by `user_id || 0x00 || plan_id`.
    /// Value is empty (index only).
    pub const PLANS_BY_USER: &str = "plans_by_user";

    /// Installments, keyed by `installment_id`.
    pub const INSTALLMENTS: &str = "installments";

    /// Index: installments by plan, keyed by `plan_id || sequence || installment_id`.
    pub const INSTALLMENTS_BY_PLAN: &str = "installments_by_plan";

    /// Index: installments by user, keyed by `user_id || 0x00 || installment_id`.
    pub const INSTALLMENTS_BY_USER: &str = "installments_by_user";

    /// Index: `UPCOMING` installments only, keyed by `due_date || installment_id`.
    /// The overdue sweep range-scans this family.
    pub const UPCOMING_BY_DUE_DATE: &str = "upcoming_by_due_date";

    /// Refunds, keyed by `refund_id`.
    pub const REFUNDS: &str = "refunds";

    /// Unique index: merchant `transaction_id` to `refund_id`.
    pub const REFUNDS_BY_TRANSACTION: &str = "refunds_by_transaction";

    /// Index: refunds by user, keyed by `user_id || 0x00 || refund_id`.
    pub const REFUNDS_BY_USER: &str = "refunds_by_user";

    /// Cached idempotent responses, keyed by the client key.
    pub const IDEMPOTENCY: &str = "idempotency";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::PLANS,
        cf::PLANS_BY_USER,
        cf::INSTALLMENTS,
        cf::INSTALLMENTS_BY_PLAN,
        cf::INSTALLMENTS_BY_USER,
        cf::UPCOMING_BY_DUE_DATE,
        cf::REFUNDS,
        cf::REFUNDS_BY_TRANSACTION,
        cf::REFUNDS_BY_USER,
        cf::IDEMPOTENCY,
    ]
}
