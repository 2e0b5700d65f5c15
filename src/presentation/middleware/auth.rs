//! Authentication Middleware
//!
//! Bearer token validation for REST routes and the realtime gateway. On
//! success the verified [`Identity`] is inserted into request extensions.

use axum::{
    extract::{Query, Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use crate::application::services::AuthError;
use crate::shared::error::AppError;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Browsers cannot set headers on a websocket handshake, so the gateway also
/// accepts `?token=`.
fn query_token(uri: &Uri) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
}

async fn authenticate(
    state: &AppState,
    mut request: Request,
    next: Next,
    token: Option<String>,
) -> Result<Response, AppError> {
    let token = token.ok_or(AuthError::MissingCredential)?;
    let identity = state.verifier.verify(&token).await.map_err(|e| {
        tracing::debug!(error = %e, path = %request.uri().path(), "Rejected credential");
        e
    })?;

    // Insert authenticated user into request extensions
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Authentication middleware for REST routes (`Authorization: Bearer`).
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).map(str::to_owned);
    authenticate(&state, request, next, token).await
}

/// Authentication for the websocket handshake. Runs before the upgrade, so
/// a bad credential is refused with 401 and no socket is opened.
pub async fn gateway_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .map(str::to_owned)
        .or_else(|| query_token(request.uri()));
    authenticate(&state, request, next, token).await
}
