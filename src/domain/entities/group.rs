//! Durable group membership.
//!
//! Maps to the `group_members` table. Group CRUD lives outside this server;
//! the realtime core only asks whether a user belongs to a group.

use async_trait::async_trait;

use crate::shared::error::AppError;

/// Repository trait for group membership checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Check whether `user_id` is a durable member of `group_id`.
    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError>;
}
