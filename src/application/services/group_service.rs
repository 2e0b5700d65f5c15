//! Group Service
//!
//! Bridges durable group membership and the live overlay: a connection may
//! only watch, or post to, a group its user belongs to.

use std::sync::Arc;

use crate::application::realtime::{
    ConnectionHandle, ConnectionId, GroupNotice, GroupOverlay, ServerEvent,
};
use crate::domain::{GroupRepository, Identity};
use crate::shared::error::AppError;

/// Group errors
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("Not a member of group {0}")]
    NotMember(i64),

    #[error(transparent)]
    Repository(#[from] AppError),
}

impl From<GroupError> for AppError {
    fn from(err: GroupError) -> Self {
        match err {
            GroupError::NotMember(_) => AppError::Forbidden(err.to_string()),
            GroupError::Repository(inner) => inner,
        }
    }
}

pub struct GroupService<G>
where
    G: GroupRepository,
{
    groups: Arc<G>,
    overlay: Arc<GroupOverlay>,
}

impl<G> GroupService<G>
where
    G: GroupRepository,
{
    pub fn new(groups: Arc<G>, overlay: Arc<GroupOverlay>) -> Self {
        Self { groups, overlay }
    }

    /// Fail unless `identity` is a durable member of `group_id`.
    pub async fn ensure_member(&self, identity: &Identity, group_id: i64) -> Result<(), GroupError> {
        if self.groups.is_member(group_id, identity.user_id).await? {
            Ok(())
        } else {
            tracing::debug!(user_id = identity.user_id, group_id, "Membership check failed");
            Err(GroupError::NotMember(group_id))
        }
    }

    /// Start streaming `group_id` to `connection` and announce it to the
    /// group. Joining a group already watched is a no-op.
    pub async fn join(
        &self,
        identity: &Identity,
        group_id: i64,
        connection: ConnectionHandle,
    ) -> Result<bool, GroupError> {
        self.ensure_member(identity, group_id).await?;

        let connection_id = connection.id();
        if !self.overlay.subscribe(group_id, connection) {
            return Ok(false);
        }
        self.overlay.publish(
            group_id,
            &ServerEvent::UserJoined(GroupNotice::joined(&identity.username, group_id)),
        );
        tracing::info!(
            user_id = identity.user_id,
            group_id,
            connection_id = %connection_id,
            "Joined group"
        );
        Ok(true)
    }

    /// Stop streaming `group_id` to a connection. Remaining subscribers are
    /// told; leaving a group never joined is a no-op.
    pub fn leave(&self, identity: &Identity, group_id: i64, connection_id: ConnectionId) -> bool {
        if !self.overlay.unsubscribe(group_id, connection_id) {
            return false;
        }
        self.overlay.publish(
            group_id,
            &ServerEvent::UserLeft(GroupNotice::left(&identity.username, group_id)),
        );
        tracing::info!(user_id = identity.user_id, group_id, "Left group");
        true
    }
}
