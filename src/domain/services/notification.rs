//! Push notification contract.
//!
//! The realtime core hands a notification to a [`PushGateway`] when a direct
//! message recipient has no live connection. Delivery is best-effort.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::entities::{DeviceToken, Message};

/// Notification handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    /// String-only key/value data, as FCM requires
    pub data: BTreeMap<String, String>,
}

impl PushNotification {
    /// Notification for a direct message: the sender's handle as title and
    /// the message text as body.
    pub fn for_direct_message(sender_username: &str, message: &Message) -> Self {
        let mut data = BTreeMap::new();
        data.insert("messageId".to_string(), message.id.to_string());
        data.insert("senderId".to_string(), message.sender_id.to_string());
        Self {
            title: sender_username.to_string(),
            body: message.content.clone(),
            data,
        }
    }
}

/// Push gateway failures. Never surfaced to the message sender.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("push notifications are disabled")]
    Disabled,

    #[error("push transport error: {0}")]
    Transport(String),

    #[error("push rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers notifications to offline devices.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, token: &DeviceToken, notification: &PushNotification) -> Result<(), PushError>;
}
