//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, gateway_auth_middleware, track_metrics};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket gateway endpoint, authenticated before the upgrade
        .merge(gateway_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

fn gateway_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/gateway", get(ws_handler))
        .route_layer(middleware::from_fn_with_state(state, gateway_auth_middleware))
}

/// API v1 routes (protected)
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/messages",
            post(handlers::message::send_direct_message).get(handlers::message::list_inbox),
        )
        .route(
            "/messages/conversation/{user_id}",
            get(handlers::message::get_conversation),
        )
        .route(
            "/groups/{group_id}/messages",
            post(handlers::message::send_group_message),
        )
        .route("/presence", get(handlers::presence::get_presence))
        .route("/devices", put(handlers::device::register_device))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
