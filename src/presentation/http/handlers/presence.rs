//! Presence Handlers

use axum::{extract::State, Json};

use crate::application::dto::PresenceResponse;
use crate::startup::AppState;

/// Current snapshot of registered users, the same data `activeUsers` carries.
pub async fn get_presence(State(state): State<AppState>) -> Json<PresenceResponse> {
    let snapshot = state.registry.snapshot();
    Json(PresenceResponse {
        version: snapshot.version,
        users: snapshot.users,
    })
}
