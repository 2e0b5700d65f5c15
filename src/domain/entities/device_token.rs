//! Device token entity and repository trait.
//!
//! Maps to the `device_tokens` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Platform a push token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
            Self::Web => "web",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "android" => Some(Self::Android),
            "ios" => Some(Self::Ios),
            "web" => Some(Self::Web),
            _ => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Push token registered by a user's device.
///
/// Maps to the `device_tokens` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - user_id: BIGINT NOT NULL REFERENCES users(id)
/// - token: TEXT NOT NULL UNIQUE
/// - platform: VARCHAR(16) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub platform: Platform,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for device tokens.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceTokenRepository: Send + Sync {
    /// Most recently registered token for a user, if any.
    async fn find_by_user(&self, user_id: i64) -> Result<Option<DeviceToken>, AppError>;

    /// Insert a token, or re-assign an existing token string to this user.
    async fn upsert(&self, token: &DeviceToken) -> Result<DeviceToken, AppError>;
}
