//! Response DTOs
//!
//! Data structures for API response bodies.

use serde::Serialize;

use crate::application::realtime::ActiveUser;
use crate::application::services::{DirectDelivery, GroupDelivery};
use crate::domain::{DeviceToken, MediaItem, Message};

/// Stored message response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub id: String,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub content: String,
    pub media: Vec<MediaItem>,
    pub created_at: String,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.to_string(),
            sender_id: message.sender_id.to_string(),
            recipient_id: message.target.recipient_id().map(|id| id.to_string()),
            group_id: message.target.group_id().map(|id| id.to_string()),
            content: message.content,
            media: message.media,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Direct send response
#[derive(Debug, Serialize)]
pub struct DirectSendResponse {
    pub message: MessageResponse,
    /// `delivered`, `pushed` or `offline`
    pub delivery: &'static str,
}

impl From<DirectDelivery> for DirectSendResponse {
    fn from(delivery: DirectDelivery) -> Self {
        Self {
            delivery: delivery.outcome.label(),
            message: delivery.message.into(),
        }
    }
}

/// Group send response
#[derive(Debug, Serialize)]
pub struct GroupSendResponse {
    pub message: MessageResponse,
    pub delivered_to: usize,
}

impl From<GroupDelivery> for GroupSendResponse {
    fn from(delivery: GroupDelivery) -> Self {
        Self {
            message: delivery.message.into(),
            delivered_to: delivery.connections,
        }
    }
}

/// Presence snapshot response
#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub version: u64,
    pub users: Vec<ActiveUser>,
}

/// Registered device response
#[derive(Debug, Serialize)]
pub struct DeviceTokenResponse {
    pub id: String,
    pub platform: String,
    pub created_at: String,
}

impl From<DeviceToken> for DeviceTokenResponse {
    fn from(token: DeviceToken) -> Self {
        Self {
            id: token.id.to_string(),
            platform: token.platform.as_str().to_string(),
            created_at: token.created_at.to_rfc3339(),
        }
    }
}
