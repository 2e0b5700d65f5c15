//! WebSocket Message Types
//!
//! Inbound client events. Every frame is `{"event": <name>, "data": <payload>}`;
//! outbound events are [`ServerEvent`](crate::application::realtime::ServerEvent).

use serde::Deserialize;

use crate::application::dto::deserialize_id;
use crate::domain::MediaItem;

/// Client to server events
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Announce the connection as the authenticated user
    RegisterUser(RegisterPayload),
    SendMessage(SendMessagePayload),
    JoinGroup(#[serde(deserialize_with = "deserialize_id")] i64),
    LeaveGroup(#[serde(deserialize_with = "deserialize_id")] i64),
    SendGroupMessage(SendGroupMessagePayload),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegisterUser(_) => "registerUser",
            Self::SendMessage(_) => "sendMessage",
            Self::JoinGroup(_) => "joinGroup",
            Self::LeaveGroup(_) => "leaveGroup",
            Self::SendGroupMessage(_) => "sendGroupMessage",
        }
    }
}

/// `registerUser` carries the handle, bare or as `{"username": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RegisterPayload {
    Handle(String),
    Object { username: String },
}

impl RegisterPayload {
    pub fn handle(&self) -> &str {
        match self {
            Self::Handle(handle) | Self::Object { username: handle } => handle,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub recipient_id: i64,
    #[serde(default)]
    pub content: String,
    /// Sender handle as the client sees it; the authenticated identity wins
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupMessagePayload {
    #[serde(deserialize_with = "deserialize_id")]
    pub group_id: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}
