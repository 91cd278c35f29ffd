//! Refund workflow integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn create_refund_is_pending() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;

    let refund = harness.create_refund("usr-1", "TXN1", "75.50").await;

    assert_eq!(refund["status"], "PENDING");
    assert_eq!(refund["amount"], "75.50");
    assert_eq!(refund["transaction_id"], "TXN1");
    assert_eq!(refund["reason"], "Product defect");
}

#[tokio::test]
async fn create_refund_twice_returns_existing() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;
    let first = harness.create_refund("usr-1", "TXN1", "75.50").await;

    let response = harness
        .server
        .post("/v1/refunds")
        .json(&json!({ "user_id": "usr-1", "transaction_id": "TXN1", "amount": "10.00" }))
        .await;

    response.assert_status_ok();
    let second: serde_json::Value = response.json();
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["amount"], "75.50");

    let list: serde_json::Value = harness.server.get("/v1/refunds").await.json();
    assert_eq!(list["refunds"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_refund_validates_input() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;

    for body in [
        json!({ "user_id": "usr-1", "transaction_id": "  ", "amount": "10.00" }),
        json!({ "user_id": "usr-1", "transaction_id": "TXN2", "amount": "0" }),
        json!({ "user_id": "usr-1", "transaction_id": "TXN3" }),
    ] {
        harness
            .server
            .post("/v1/refunds")
            .json(&body)
            .await
            .assert_status_bad_request();
    }

    harness
        .server
        .post("/v1/refunds")
        .json(&json!({ "user_id": "ghost", "transaction_id": "TXN4", "amount": "1.00" }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn list_refunds_filters_by_user() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;
    harness.register("usr-2").await;
    harness.create_refund("usr-1", "TXN1", "1.00").await;
    harness.create_refund("usr-2", "TXN2", "2.00").await;

    let body: serde_json::Value = harness
        .server
        .get("/v1/refunds")
        .add_query_param("user_id", "usr-1")
        .await
        .json();

    let refunds = body["refunds"].as_array().unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0]["transaction_id"], "TXN1");
}

// ============================================================================
// Decisions
// ============================================================================

#[tokio::test]
async fn approve_refund_then_approve_again_conflicts() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;
    let refund = harness.create_refund("usr-1", "TXN1", "75.50").await;
    let path = format!("/v1/refunds/{}/approve", refund["id"].as_str().unwrap());

    let response = harness
        .server
        .post(&path)
        .json(&json!({ "action": "approve" }))
        .await;
    response.assert_status_ok();
    let approved: serde_json::Value = response.json();
    assert_eq!(approved["status"], "APPROVED");
    assert!(approved["processed_at"].is_string());

    let again = harness
        .server
        .post(&path)
        .json(&json!({ "action": "approve" }))
        .await;
    again.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = again.json();
    assert_eq!(body["error"]["code"], "conflict");
}

#[tokio::test]
async fn reject_refund_records_reason() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;
    let refund = harness.create_refund("usr-1", "TXN1", "75.50").await;
    let path = format!("/v1/refunds/{}/approve", refund["id"].as_str().unwrap());

    let rejected: serde_json::Value = harness
        .server
        .post(&path)
        .json(&json!({ "action": "reject", "reason": "out of window" }))
        .await
        .json();

    assert_eq!(rejected["status"], "REJECTED");
    assert_eq!(rejected["reason"], "Rejected: out of window");
}

#[tokio::test]
async fn unknown_action_is_bad_request() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;
    let refund = harness.create_refund("usr-1", "TXN1", "75.50").await;
    let path = format!("/v1/refunds/{}/approve", refund["id"].as_str().unwrap());

    harness
        .server
        .post(&path)
        .json(&json!({ "action": "escalate" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn cancel_pending_refund() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;
    let refund = harness.create_refund("usr-1", "TXN1", "75.50").await;
    let id = refund["id"].as_str().unwrap();

    let response = harness
        .server
        .post(&format!("/v1/refunds/{id}/cancel"))
        .await;

    response.assert_status_ok();
    let cancelled: serde_json::Value = response.json();
    assert_eq!(cancelled["status"], "REJECTED");
    assert_eq!(cancelled["reason"], "Cancelled by user");

    harness
        .server
        .post(&format!("/v1/refunds/{id}/cancel"))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn decide_unknown_refund_is_not_found() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/refunds/00000000-0000-4000-8000-000000000000/approve")
        .json(&json!({ "action": "approve" }))
        .await
        .assert_status_not_found();
}
