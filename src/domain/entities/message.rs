//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Kind of an attached media item, matching the `media` JSONB entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    File,
}

/// A media attachment referenced by URL. Upload and storage happen elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Where a message is addressed. A message is either direct or group-scoped,
/// never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageTarget {
    Direct { recipient_id: i64 },
    Group { group_id: i64 },
}

impl MessageTarget {
    pub fn recipient_id(&self) -> Option<i64> {
        match self {
            Self::Direct { recipient_id } => Some(*recipient_id),
            Self::Group { .. } => None,
        }
    }

    pub fn group_id(&self) -> Option<i64> {
        match self {
            Self::Direct { .. } => None,
            Self::Group { group_id } => Some(*group_id),
        }
    }

    /// Label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct",
            Self::Group { .. } => "group",
        }
    }
}

/// Represents a persisted message.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - sender_id: BIGINT NOT NULL REFERENCES users(id)
/// - recipient_id: BIGINT NULL REFERENCES users(id)
/// - group_id: BIGINT NULL REFERENCES groups(id)
/// - content: TEXT NOT NULL
/// - media: JSONB NOT NULL DEFAULT '[]'
/// - created_at: TIMESTAMPTZ NOT NULL
///
/// A CHECK constraint keeps exactly one of `recipient_id` / `group_id` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub target: MessageTarget,
    pub content: String,
    pub media: Vec<MediaItem>,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for Message persistence.
///
/// Messages are immutable once created.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message and return the stored record.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Direct messages exchanged between two users, oldest first.
    ///
    /// With `before`, only messages with a smaller id are considered; the
    /// `limit` most recent of those are returned.
    async fn find_conversation(
        &self,
        user_a: i64,
        user_b: i64,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError>;

    /// Direct messages addressed to a user, newest first.
    async fn find_for_recipient(
        &self,
        user_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, AppError>;
}
