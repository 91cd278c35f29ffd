//! Key encoding utilities for `RocksDB`.
//!
//! User ids are variable-length strings without control characters, so a
//! `0x00` separator after them keeps per-user prefixes unambiguous.

use chrono::{Datelike, NaiveDate};

use bnpl_core::{InstallmentId, PlanId, RefundId, UserId};

const SEPARATOR: u8 = 0x00;

/// Length of an encoded UUID identifier.
pub const ID_LEN: usize = 16;

/// Create a user key from a user ID.
#[must_use]
pub fn user_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a prefix for iterating all index entries owned by a user.
///
/// Format: `user_id || 0x00`
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(user_id.as_bytes().len() + 1);
    key.extend_from_slice(user_id.as_bytes());
    key.push(SEPARATOR);
    key
}

/// Create a per-user index key for a UUID-identified row.
///
/// Format: `user_id || 0x00 || id (16 bytes)`
#[must_use]
pub fn user_index_key(user_id: &UserId, id: &[u8; ID_LEN]) -> Vec<u8> {
    let mut key = user_prefix(user_id);
    key.extend_from_slice(id);
    key
}

/// Create a plan key from a plan ID.
#[must_use]
pub fn plan_key(plan_id: &PlanId) -> Vec<u8> {
    plan_id.as_bytes().to_vec()
}

/// Create an installment key from an installment ID.
#[must_use]
pub fn installment_key(installment_id: &InstallmentId) -> Vec<u8> {
    installment_id.as_bytes().to_vec()
}

/// Create a plan-installment index key.
///
/// Format: `plan_id (16 bytes) || sequence (4 bytes BE) || installment_id (16 bytes)`
///
/// Installments of a plan iterate in sequence order.
#[must_use]
pub fn plan_installment_key(
    plan_id: &PlanId,
    sequence: u32,
    installment_id: &InstallmentId,
) -> Vec<u8> {
    let mut key = Vec::with_capacity(ID_LEN * 2 + 4);
    key.extend_from_slice(plan_id.as_bytes());
    key.extend_from_slice(&sequence.to_be_bytes());
    key.extend_from_slice(installment_id.as_bytes());
    key
}

/// Create a prefix for iterating all installments of a plan.
#[must_use]
pub fn plan_installments_prefix(plan_id: &PlanId) -> Vec<u8> {
    plan_id.as_bytes().to_vec()
}

/// Encode a date so that byte order matches chronological order.
#[must_use]
pub fn date_bytes(date: NaiveDate) -> [u8; 4] {
    // Flipping the sign bit maps i32 order onto unsigned byte order.
    #[allow(clippy::cast_sign_loss)]
    let biased = (date.num_days_from_ce() as u32) ^ 0x8000_0000;
    biased.to_be_bytes()
}

/// Create an upcoming-by-due-date index key.
///
/// Format: `due_date (4 bytes) || installment_id (16 bytes)`
#[must_use]
pub fn due_date_key(due_date: NaiveDate, installment_id: &InstallmentId) -> Vec<u8> {
    let mut key = Vec::with_capacity(4 + ID_LEN);
    key.extend_from_slice(&date_bytes(due_date));
    key.extend_from_slice(installment_id.as_bytes());
    key
}

/// Create a refund key from a refund ID.
#[must_use]
pub fn refund_key(refund_id: &RefundId) -> Vec<u8> {
    refund_id.as_bytes().to_vec()
}

/// Create a transaction index key from a merchant transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &str) -> Vec<u8> {
    transaction_id.as_bytes().to_vec()
}

/// Create an idempotency key.
#[must_use]
pub fn idempotency_key(key: &str) -> Vec<u8> {
    key.as_bytes().to_vec()
}

/// Extract the trailing 16-byte identifier from an index key.
///
/// Returns `None` if the key is shorter than an identifier.
#[must_use]
pub fn trailing_id(key: &[u8]) -> Option<[u8; ID_LEN]> {
    let start = key.len().checked_sub(ID_LEN)?;
    key[start..].try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_index_key_format() {
        let user_id: UserId = "mock-usr-001".parse().unwrap();
        let refund_id = RefundId::generate();
        let key = user_index_key(&user_id, refund_id.as_bytes());

        assert_eq!(key.len(), "mock-usr-001".len() + 1 + ID_LEN);
        assert!(key.starts_with(&user_prefix(&user_id)));
        assert_eq!(trailing_id(&key), Some(*refund_id.as_bytes()));
    }

    #[test]
    fn user_prefixes_do_not_overlap() {
        let short: UserId = "usr-1".parse().unwrap();
        let long: UserId = "usr-10".parse().unwrap();
        let key = user_index_key(&long, PlanId::generate().as_bytes());
        assert!(!key.starts_with(&user_prefix(&short)));
    }

    #[test]
    fn plan_installment_keys_sort_by_sequence() {
        let plan_id = PlanId::generate();
        let second = plan_installment_key(&plan_id, 2, &InstallmentId::generate());
        let tenth = plan_installment_key(&plan_id, 10, &InstallmentId::generate());
        assert!(second < tenth);
        assert!(second.starts_with(&plan_installments_prefix(&plan_id)));
        assert_eq!(second.len(), 36);
    }

    #[test]
    fn date_bytes_preserve_order() {
        let earlier = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let later = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(date_bytes(earlier) < date_bytes(later));

        let id = InstallmentId::generate();
        assert!(due_date_key(earlier, &id) < due_date_key(later, &id));
    }

    #[test]
    fn trailing_id_rejects_short_keys() {
        assert_eq!(trailing_id(&[1, 2, 3]), None);
    }
}
