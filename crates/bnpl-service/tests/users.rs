//! User registry integration tests.

mod common;

use axum::http::StatusCode;
use common::{user_body, TestHarness};
use serde_json::json;

#[tokio::test]
async fn register_user_returns_masked_profile() {
    let harness = TestHarness::new();

    let body = harness.register("mock-usr-001").await;

    assert_eq!(body["user_id"], "mock-usr-001");
    assert_eq!(body["full_name"], "John Doe");
    assert_eq!(body["phone_number"], "+998****4567");
    assert_eq!(body["passport_number"], "AA*******");
    assert_eq!(body["card_number"], "4111 **** **** 1111");
    assert_eq!(body["status"], "NORMAL");
}

#[tokio::test]
async fn register_duplicate_user_fails() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;

    let response = harness.server.post("/v1/users").json(&user_body("usr-1")).await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn register_with_malformed_body_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/users")
        .json(&json!({ "user_id": "usr-1" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn get_user_is_masked() {
    let harness = TestHarness::new();
    harness.register("usr-1").await;

    let response = harness.server.get("/v1/users/usr-1").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["passport_number"], "AA*******");
}

#[tokio::test]
async fn get_unknown_user_is_not_found() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/users/ghost").await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn list_users_is_ordered_by_id() {
    let harness = TestHarness::new();
    harness.register("usr-b").await;
    harness.register("usr-a").await;

    let response = harness.server.get("/v1/users").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let ids: Vec<_> = body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["user_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, ["usr-a", "usr-b"]);
}

#[tokio::test]
async fn new_user_status_cannot_be_set_by_client() {
    let harness = TestHarness::new();
    let mut body = user_body("usr-1");
    body["status"] = json!("DEBT_USER");

    let response = harness.server.post("/v1/users").json(&body).await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "NORMAL");
}
