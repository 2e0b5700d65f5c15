//! WebSocket Connection Handler
//!
//! One task per socket. The reader loop handles inbound events in arrival
//! order; a forwarder task drains the connection's outbound queue onto the
//! wire.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::time::interval;

use super::messages::ClientEvent;
use super::session::SessionState;
use crate::application::realtime::{ConnectionHandle, MessageAck, ServerEvent};
use crate::domain::Identity;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// WebSocket upgrade handler. Authentication already happened in
/// [`gateway_auth_middleware`](crate::presentation::middleware::gateway_auth_middleware).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Response {
    ws.max_message_size(state.settings.websocket.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, identity))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, identity: Identity) {
    let (handle, mut outbound) = ConnectionHandle::channel();
    let mut session = SessionState::new(handle.id(), identity);
    let connection_id = session.connection_id;

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Forward queued events to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(t) => t,
                Err(e) => {
                    tracing::error!(event = event.name(), error = %e, "Failed to serialize event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    state.presence.attach(handle.clone());
    tracing::info!(
        user_id = session.identity.user_id,
        connection_id = %connection_id,
        "Connection opened"
    );

    let idle_timeout = Duration::from_secs(state.settings.websocket.idle_timeout_secs);
    let mut idle_check = interval((idle_timeout / 3).max(Duration::from_secs(1)));
    idle_check.tick().await; // Skip first immediate tick

    // Main message loop
    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        session.touch();
                        dispatch(text.as_str(), &session, &handle, &state).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Pings, pongs and binary frames only count as activity
                        session.touch();
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            _ = idle_check.tick() => {
                if session.is_idle(idle_timeout) {
                    tracing::info!(connection_id = %connection_id, "Idle timeout, closing connection");
                    break;
                }
            }
        }
    }

    // Cleanup
    let outcome = state
        .presence
        .disconnect(&session.identity, connection_id)
        .await;
    sender_task.abort();

    tracing::info!(
        user_id = session.identity.user_id,
        connection_id = %connection_id,
        was_registered = outcome.user_id.is_some(),
        groups_left = outcome.left_groups.len(),
        frames = session.frames,
        "Connection cleaned up"
    );
}

/// Handle one inbound frame. Failures are reported to the sending
/// connection only.
async fn dispatch(text: &str, session: &SessionState, handle: &ConnectionHandle, state: &AppState) {
    let identity = &session.identity;
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(connection_id = %session.connection_id, error = %e, "Malformed event");
            handle.send(ServerEvent::error(format!("Malformed event: {}", e)));
            return;
        }
    };
    let name = event.name();

    let result: Result<(), AppError> = match event {
        ClientEvent::RegisterUser(payload) => state
            .presence
            .register_handle(identity, payload.handle(), handle.clone())
            .await
            .map(|_| ())
            .map_err(AppError::from),

        ClientEvent::SendMessage(payload) => {
            if let Some(from) = payload.from.as_deref() {
                if from != identity.username {
                    tracing::debug!(user_id = identity.user_id, claimed = %from, "Ignoring client-supplied sender");
                }
            }
            state
                .router
                .route_direct(identity, payload.recipient_id, payload.content, payload.media)
                .await
                .map(|delivery| {
                    handle.send(ServerEvent::MessageSent(MessageAck::from(&delivery.message)));
                })
                .map_err(AppError::from)
        }

        ClientEvent::JoinGroup(group_id) => state
            .groups
            .join(identity, group_id, handle.clone())
            .await
            .map(|_| ())
            .map_err(AppError::from),

        ClientEvent::LeaveGroup(group_id) => {
            state.groups.leave(identity, group_id, handle.id());
            Ok(())
        }

        ClientEvent::SendGroupMessage(payload) => {
            match state.groups.ensure_member(identity, payload.group_id).await {
                Ok(()) => state
                    .router
                    .route_group(identity, payload.group_id, payload.content, payload.media)
                    .await
                    .map(|delivery| {
                        handle.send(ServerEvent::MessageSent(MessageAck::from(&delivery.message)));
                    })
                    .map_err(AppError::from),
                Err(e) => Err(e.into()),
            }
        }
    };

    if let Err(e) = result {
        tracing::debug!(
            connection_id = %session.connection_id,
            event = name,
            error = %e,
            "Event failed"
        );
        handle.send(ServerEvent::error(e.public_message()));
    }
}
