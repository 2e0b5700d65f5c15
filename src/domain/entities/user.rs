//! User entity and repository trait.
//!
//! Maps to the `users` table. Only the presence columns are owned by this
//! server; profile data is managed elsewhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Presence-relevant view of a user account.
///
/// Maps to the `users` table:
/// - id: BIGINT PRIMARY KEY
/// - username: VARCHAR(32) NOT NULL UNIQUE
/// - is_active: BOOLEAN NOT NULL DEFAULT FALSE
/// - last_active: TIMESTAMPTZ NULL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// True while at least one live registration exists for this user
    pub is_active: bool,
    pub last_active: Option<DateTime<Utc>>,
}

/// Durable presence write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub is_active: bool,
    pub last_active: DateTime<Utc>,
}

impl PresenceUpdate {
    pub fn now(is_active: bool) -> Self {
        Self {
            is_active,
            last_active: Utc::now(),
        }
    }
}

/// Repository trait for the user presence columns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist `is_active` / `last_active` for a user.
    async fn update_presence(&self, user_id: i64, update: PresenceUpdate) -> Result<(), AppError>;
}
