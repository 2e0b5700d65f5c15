//! Outbound realtime events (server → client).
//!
//! Serialized as `{"event": "<name>", "data": <payload>}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{MediaItem, Message};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Snapshot of every registered user, broadcast to all connections
    ActiveUsers(Vec<ActiveUser>),
    /// Direct message, delivered only to the recipient's connections
    DirectMessage(DirectMessageEvent),
    /// Group message, delivered only to the group's subscribers
    MessageReceived(GroupMessageEvent),
    UserJoined(GroupNotice),
    UserLeft(GroupNotice),
    /// Acknowledges a send once the message is persisted
    MessageSent(MessageAck),
    Error(ErrorEvent),
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ActiveUsers(_) => "activeUsers",
            Self::DirectMessage(_) => "directMessage",
            Self::MessageReceived(_) => "messageReceived",
            Self::UserJoined(_) => "userJoined",
            Self::UserLeft(_) => "userLeft",
            Self::MessageSent(_) => "messageSent",
            Self::Error(_) => "error",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorEvent {
            message: message.into(),
        })
    }
}

/// One entry of the `activeUsers` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub user_id: String,
    pub username: String,
    /// Id of the user's most recent registered connection
    #[serde(rename = "connection_details")]
    pub connection_details: String,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessageEvent {
    pub message_id: String,
    /// Sender user id
    pub sender: String,
    /// Sender handle
    pub from: String,
    pub content: String,
    pub media: Vec<MediaItem>,
    pub timestamp: DateTime<Utc>,
}

impl DirectMessageEvent {
    pub fn from_message(message: &Message, sender_username: &str) -> Self {
        Self {
            message_id: message.id.to_string(),
            sender: message.sender_id.to_string(),
            from: sender_username.to_string(),
            content: message.content.clone(),
            media: message.media.clone(),
            timestamp: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMessageEvent {
    pub message_id: String,
    pub sender: String,
    pub from: String,
    pub group_id: String,
    pub content: String,
    pub media: Vec<MediaItem>,
    pub timestamp: DateTime<Utc>,
}

impl GroupMessageEvent {
    pub fn from_message(message: &Message, group_id: i64, sender_username: &str) -> Self {
        Self {
            message_id: message.id.to_string(),
            sender: message.sender_id.to_string(),
            from: sender_username.to_string(),
            group_id: group_id.to_string(),
            content: message.content.clone(),
            media: message.media.clone(),
            timestamp: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNotice {
    pub message: String,
    pub group_id: String,
}

impl GroupNotice {
    pub fn joined(username: &str, group_id: i64) -> Self {
        Self {
            message: format!("{username} joined the group"),
            group_id: group_id.to_string(),
        }
    }

    pub fn left(username: &str, group_id: i64) -> Self {
        Self {
            message: format!("{username} left the group"),
            group_id: group_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAck {
    pub message_id: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for MessageAck {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id.to_string(),
            timestamp: message.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
}
