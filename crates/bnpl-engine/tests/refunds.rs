//! Refund workflow and merchant webhooks.

mod common;

use std::sync::Arc;
use std::thread;

use bnpl_core::{
    BnplError, Clock, RefundDecision, RefundId, RefundStatus, WebhookStatus, CANCELLED_REASON,
};
use common::{amount, uid, TestHarness};

// ============================================================================
// Creation
// ============================================================================

#[test]
fn create_refund_is_pending() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");

    let outcome = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("75.50"), Some("Damaged".into()))
        .unwrap();
    assert!(!outcome.is_replayed());

    let refund = outcome.into_inner();
    assert_eq!(refund.status, RefundStatus::Pending);
    assert_eq!(refund.amount, amount("75.50"));
    assert_eq!(refund.reason, "Damaged");
    assert!(refund.processed_at.is_none());
}

#[test]
fn same_transaction_returns_existing_refund() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");

    let first = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("75.50"), None)
        .unwrap()
        .into_inner();
    let second = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("10.00"), None)
        .unwrap();

    assert!(second.is_replayed());
    assert_eq!(second.value().id, first.id);
    assert_eq!(second.value().amount, amount("75.50"));
    assert_eq!(harness.ledger.list_refunds(None).unwrap().len(), 1);
}

#[test]
fn create_refund_validation() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");

    let err = harness
        .ledger
        .create_refund(&user.user_id, "  ", amount("10.00"), None)
        .unwrap_err();
    assert!(matches!(err, BnplError::Validation(_)));

    let err = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("0"), None)
        .unwrap_err();
    assert!(matches!(err, BnplError::Validation(_)));

    let err = harness
        .ledger
        .create_refund(&uid("ghost"), "TXN1", amount("10.00"), None)
        .unwrap_err();
    assert!(err.is_not_found());

    assert!(harness.ledger.list_refunds(None).unwrap().is_empty());
}

#[test]
fn concurrent_creates_for_one_transaction_make_one_row() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&harness.ledger);
            let user_id = user.user_id.clone();
            thread::spawn(move || {
                ledger
                    .create_refund(&user_id, "TXN-RACE", amount("20.00"), None)
                    .unwrap()
                    .into_inner()
                    .id
            })
        })
        .collect();
    let ids: Vec<RefundId> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(harness.ledger.list_refunds(None).unwrap().len(), 1);
}

#[test]
fn list_refunds_by_user() {
    let harness = TestHarness::new();
    let alice = harness.register("alice");
    let bob = harness.register("bob");

    for txn in ["TXN1", "TXN2"] {
        harness
            .ledger
            .create_refund(&alice.user_id, txn, amount("5.00"), None)
            .unwrap();
    }
    harness
        .ledger
        .create_refund(&bob.user_id, "TXN3", amount("5.00"), None)
        .unwrap();

    assert_eq!(harness.ledger.list_refunds(Some(&alice.user_id)).unwrap().len(), 2);
    assert_eq!(harness.ledger.list_refunds(Some(&bob.user_id)).unwrap().len(), 1);
    assert_eq!(harness.ledger.list_refunds(None).unwrap().len(), 3);
}

// ============================================================================
// Decisions
// ============================================================================

#[test]
fn approved_refund_cannot_be_approved_again() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let refund = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("75.50"), None)
        .unwrap()
        .into_inner();

    let approved = harness
        .ledger
        .approve_or_reject(&refund.id, RefundDecision::Approve, None)
        .unwrap();
    assert_eq!(approved.status, RefundStatus::Approved);
    assert_eq!(approved.processed_at, Some(harness.clock.now()));

    let err = harness
        .ledger
        .approve_or_reject(&refund.id, RefundDecision::Approve, None)
        .unwrap_err();
    assert!(matches!(err, BnplError::InvalidState { .. }));
    assert_eq!(harness.ledger.get_refund(&refund.id).unwrap(), approved);
}

#[test]
fn reject_records_reason() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let refund = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("75.50"), Some("Late".into()))
        .unwrap()
        .into_inner();

    let rejected = harness
        .ledger
        .approve_or_reject(&refund.id, RefundDecision::Reject, Some("Outside window"))
        .unwrap();
    assert_eq!(rejected.status, RefundStatus::Rejected);
    assert_eq!(rejected.reason, "Rejected: Outside window");
    assert!(rejected.processed_at.is_some());
}

#[test]
fn cancel_pending_refund() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let refund = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("75.50"), None)
        .unwrap()
        .into_inner();

    let cancelled = harness.ledger.cancel_refund(&refund.id).unwrap();
    assert_eq!(cancelled.status, RefundStatus::Rejected);
    assert_eq!(cancelled.reason, CANCELLED_REASON);

    let err = harness.ledger.cancel_refund(&refund.id).unwrap_err();
    assert!(matches!(err, BnplError::InvalidState { .. }));
    assert!(harness
        .ledger
        .cancel_refund(&RefundId::generate())
        .unwrap_err()
        .is_not_found());
}

// ============================================================================
// Webhooks
// ============================================================================

#[test]
fn webhook_resolves_by_id_or_transaction() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    let by_id = harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("10.00"), None)
        .unwrap()
        .into_inner();
    harness
        .ledger
        .create_refund(&user.user_id, "TXN2", amount("20.00"), None)
        .unwrap();

    let outcome = harness
        .ledger
        .apply_webhook(&by_id.id.to_string(), WebhookStatus::Approved, Some("M-1"))
        .unwrap();
    assert!(outcome.changed);
    assert_eq!(outcome.refund.status, RefundStatus::Approved);
    assert_eq!(outcome.refund.merchant_reference.as_deref(), Some("M-1"));

    let outcome = harness
        .ledger
        .apply_webhook("TXN2", WebhookStatus::Failed, None)
        .unwrap();
    assert_eq!(outcome.refund.status, RefundStatus::Rejected);
    assert_eq!(outcome.refund.reason, "Failed via webhook: No reference");
}

#[test]
fn webhook_for_unknown_refund_is_not_found() {
    let harness = TestHarness::new();
    harness.register("mock-usr-001");

    let err = harness
        .ledger
        .apply_webhook("TXN-UNKNOWN", WebhookStatus::Approved, None)
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(harness.ledger.list_refunds(None).unwrap().is_empty());
}

#[test]
fn webhook_processing_and_redelivery_are_noops() {
    let harness = TestHarness::new();
    let user = harness.register("mock-usr-001");
    harness
        .ledger
        .create_refund(&user.user_id, "TXN1", amount("10.00"), None)
        .unwrap();

    let outcome = harness
        .ledger
        .apply_webhook("TXN1", WebhookStatus::Processing, None)
        .unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.refund.status, RefundStatus::Pending);

    let rejected = harness
        .ledger
        .apply_webhook("TXN1", WebhookStatus::Rejected, Some("M-9"))
        .unwrap();
    assert!(rejected.changed);
    assert_eq!(rejected.refund.reason, "Rejected via webhook: M-9");

    let redelivered = harness
        .ledger
        .apply_webhook("TXN1", WebhookStatus::Rejected, Some("M-9"))
        .unwrap();
    assert!(!redelivered.changed);
    assert_eq!(redelivered.refund, rejected.refund);

    let err = harness
        .ledger
        .apply_webhook("TXN1", WebhookStatus::Approved, None)
        .unwrap_err();
    assert!(matches!(err, BnplError::InvalidState { .. }));
}
