//! REST API Tests
//!
//! Only paths that are decided before the database is touched.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{issue_token, TestApp};

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/presence").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_presence_snapshot_is_empty_at_start() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/api/v1/presence")
        .authorization_bearer(issue_token(1, "alice"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let json: Value = response.json();
    assert_eq!(json["version"], 0);
    assert_eq!(json["users"], json!([]));
}

#[tokio::test]
async fn test_empty_direct_message_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/messages")
        .authorization_bearer(issue_token(1, "alice"))
        .json(&json!({ "recipientId": "2", "content": "   " }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_group_message_with_bad_group_id_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/v1/groups/not-a-number/messages")
        .authorization_bearer(issue_token(1, "alice"))
        .json(&json!({ "content": "hello" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_device_platform_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .put("/api/v1/devices")
        .authorization_bearer(issue_token(1, "alice"))
        .json(&json!({ "token": "fcm-token", "platform": "blackberry" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inbox_requires_bearer_token() {
    let app = TestApp::new();

    let response = app.server.get("/api/v1/messages").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_conversation_with_bad_user_id_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/api/v1/messages/conversation/bob")
        .authorization_bearer(issue_token(1, "alice"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inbox_with_bad_cursor_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/api/v1/messages")
        .add_query_param("before", "yesterday")
        .authorization_bearer(issue_token(1, "alice"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
