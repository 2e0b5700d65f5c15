//! Cache Module
//!
//! Redis connection management and the presence mirror.
//!
//! Redis is optional: with `redis.enabled = false` no connection is made and
//! presence lives only in process memory.

mod presence_cache;

pub use presence_cache::{MirroredPresence, RedisPresenceMirror};

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

use crate::config::RedisSettings;

/// Creates a Redis connection manager with automatic reconnection.
///
/// # Returns
/// * `Ok(ConnectionManager)` - On successful connection
/// * `Err(redis::RedisError)` - If connection fails
#[instrument(skip(settings), fields(url = %settings.url))]
pub async fn create_redis_client(
    settings: &RedisSettings,
) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(settings.url.as_str())?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Cache key prefixes.
pub mod keys {
    /// Prefix for user presence/online status (e.g., "presence:user_id")
    pub const USER_PRESENCE: &str = "presence:";

    /// Generates a presence key for a user
    #[inline]
    pub fn presence(user_id: impl std::fmt::Display) -> String {
        format!("{}{}", USER_PRESENCE, user_id)
    }
}
