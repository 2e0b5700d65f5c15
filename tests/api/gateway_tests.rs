//! Gateway Authentication Tests
//!
//! The upgrade request is authenticated before any socket exists.

use axum::http::StatusCode;

use crate::common::{issue_token, TestApp};

#[tokio::test]
async fn test_gateway_without_credential_is_rejected() {
    let app = TestApp::new();

    let response = app.server.get("/gateway").await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.state.registry.connection_count(), 0);
}

#[tokio::test]
async fn test_gateway_with_forged_token_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/gateway")
        .add_query_param("token", "not-a-jwt")
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

/// A valid credential gets past authentication; the plain GET then fails the
/// upgrade handshake instead.
#[tokio::test]
async fn test_gateway_with_valid_token_reaches_upgrade() {
    let app = TestApp::new();
    let token = issue_token(1, "alice");

    let response = app
        .server
        .get("/gateway")
        .add_query_param("token", &token)
        .await;

    assert_ne!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert!(response.status_code().is_client_error());
}
