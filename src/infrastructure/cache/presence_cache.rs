//! Presence Cache
//!
//! Redis mirror of this process's live presence, one expiring key per online
//! user. Keys outlive a crashed process by at most the TTL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use super::keys;
use crate::domain::PresenceMirror;
use crate::shared::error::AppError;

/// Value stored under `presence:{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredPresence {
    pub user_id: i64,
    pub status: String,
    /// Unix timestamp of the last refresh
    pub last_seen: i64,
}

impl MirroredPresence {
    pub fn online(user_id: i64, since: DateTime<Utc>) -> Self {
        Self {
            user_id,
            status: "online".to_string(),
            last_seen: since.timestamp(),
        }
    }
}

#[derive(Clone)]
pub struct RedisPresenceMirror {
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl RedisPresenceMirror {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Read a mirrored presence entry.
    pub async fn get(&self, user_id: i64) -> Result<Option<MirroredPresence>, AppError> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(keys::presence(user_id)).await?;

        value
            .map(|json| {
                serde_json::from_str(&json)
                    .map_err(|e| AppError::Internal(format!("Deserialization error: {}", e)))
            })
            .transpose()
    }
}

#[async_trait]
impl PresenceMirror for RedisPresenceMirror {
    async fn mark_online(&self, user_id: i64, since: DateTime<Utc>) -> Result<(), AppError> {
        let value = serde_json::to_string(&MirroredPresence::online(user_id, since))
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(keys::presence(user_id), value, self.ttl_secs)
            .await?;
        Ok(())
    }

    async fn mark_offline(&self, user_id: i64) -> Result<(), AppError> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(keys::presence(user_id)).await?;
        Ok(())
    }
}
