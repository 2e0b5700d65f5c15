//! Presence mirror contract.
//!
//! A mirror publishes this process's live presence to a shared store so that
//! other processes can read it. It is advisory: the in-memory registry stays
//! authoritative for this process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::shared::error::AppError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresenceMirror: Send + Sync {
    async fn mark_online(&self, user_id: i64, since: DateTime<Utc>) -> Result<(), AppError>;

    async fn mark_offline(&self, user_id: i64) -> Result<(), AppError>;
}
