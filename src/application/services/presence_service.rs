//! Presence Service
//!
//! Keeps three views of "who is online" in step: the in-memory registry, the
//! `activeUsers` snapshot every attached client sees, and the durable
//! `is_active` / `last_active` columns.
//!
//! Durable writes for one user are serialized and always re-read the registry
//! once they hold the user's lock, so the last write to land reflects the
//! registry as it was at that moment.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::application::realtime::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, GroupOverlay, GroupNotice,
    RegisterOutcome, ServerEvent,
};
use crate::domain::{Identity, PresenceMirror, PresenceUpdate, UserRepository};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Presence errors
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    /// The announced handle is not the authenticated one
    #[error("Cannot register as '{claimed}': connection is authenticated as '{authenticated}'")]
    HandleMismatch {
        claimed: String,
        authenticated: String,
    },

    /// The registration is live but the durable presence write failed
    #[error("Presence could not be persisted: {0}")]
    Persistence(#[source] AppError),
}

impl From<PresenceError> for AppError {
    fn from(err: PresenceError) -> Self {
        match err {
            PresenceError::HandleMismatch { .. } => AppError::Forbidden(err.to_string()),
            PresenceError::Persistence(inner) => inner,
        }
    }
}

/// What a disconnect cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// User whose registration this connection still held
    pub user_id: Option<i64>,
    /// Groups the connection was watching
    pub left_groups: Vec<i64>,
}

pub struct PresenceService<U>
where
    U: UserRepository,
{
    users: Arc<U>,
    registry: Arc<ConnectionRegistry>,
    overlay: Arc<GroupOverlay>,
    mirror: Option<Arc<dyn PresenceMirror>>,
    /// Per-user lock for durable writes
    write_locks: DashMap<i64, Arc<AsyncMutex<()>>>,
    /// Registry version of the last snapshot sent
    last_broadcast: Mutex<Option<u64>>,
}

impl<U> PresenceService<U>
where
    U: UserRepository,
{
    pub fn new(
        users: Arc<U>,
        registry: Arc<ConnectionRegistry>,
        overlay: Arc<GroupOverlay>,
    ) -> Self {
        Self {
            users,
            registry,
            overlay,
            mirror: None,
            write_locks: DashMap::new(),
            last_broadcast: Mutex::new(None),
        }
    }

    /// Also publish presence to a shared store.
    pub fn with_mirror(mut self, mirror: Arc<dyn PresenceMirror>) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Add a freshly authenticated connection to the audience and send it the
    /// current snapshot.
    ///
    /// Runs under the broadcast lock: a concurrent broadcast either finishes
    /// before the connection joins the audience or queues after the welcome
    /// snapshot.
    pub fn attach(&self, connection: ConnectionHandle) {
        let connection_id = connection.id();
        {
            let _broadcast = self.last_broadcast.lock();
            self.registry.attach(connection);
            let snapshot = self.registry.snapshot();
            self.registry
                .send_to_connection(connection_id, ServerEvent::ActiveUsers(snapshot.users));
        }
        self.update_gauges();
    }

    /// Handle a client's `registerUser` announcement. The handle must match
    /// the authenticated identity.
    pub async fn register_handle(
        &self,
        identity: &Identity,
        handle: &str,
        connection: ConnectionHandle,
    ) -> Result<RegisterOutcome, PresenceError> {
        if handle.trim() != identity.username {
            tracing::warn!(
                user_id = identity.user_id,
                claimed = %handle,
                "Rejected registration for a foreign handle"
            );
            return Err(PresenceError::HandleMismatch {
                claimed: handle.to_string(),
                authenticated: identity.username.clone(),
            });
        }
        self.register(identity, connection).await
    }

    /// Register `connection` for `identity` and propagate the change.
    ///
    /// The registration and the broadcast happen before any durable write.
    /// If the write fails the registration stays live and the error is
    /// returned so the caller can tell the client.
    pub async fn register(
        &self,
        identity: &Identity,
        connection: ConnectionHandle,
    ) -> Result<RegisterOutcome, PresenceError> {
        let outcome = self
            .registry
            .register(identity.user_id, &identity.username, connection);
        self.broadcast_snapshot();
        self.update_gauges();

        tracing::info!(
            user_id = identity.user_id,
            username = %identity.username,
            superseded = outcome.superseded.len(),
            "User registered"
        );

        if let Some(displaced) = outcome.displaced_user {
            if let Err(e) = self.sync_durable(displaced).await {
                tracing::warn!(user_id = displaced, error = %e, "Failed to persist displaced user presence");
            }
        }

        self.sync_durable(identity.user_id)
            .await
            .map_err(PresenceError::Persistence)?;
        Ok(outcome)
    }

    /// Tear down everything a closed connection held.
    ///
    /// Safe to call more than once and for connections that never
    /// registered, or whose registration was superseded.
    pub async fn disconnect(
        &self,
        identity: &Identity,
        connection_id: ConnectionId,
    ) -> DisconnectOutcome {
        let left_groups = self.overlay.unsubscribe_all(connection_id);
        for group_id in &left_groups {
            self.overlay.publish(
                *group_id,
                &ServerEvent::UserLeft(GroupNotice::left(&identity.username, *group_id)),
            );
        }

        let user_id = self.registry.detach(connection_id);
        self.update_gauges();

        if let Some(user_id) = user_id {
            self.broadcast_snapshot();
            if let Err(e) = self.sync_durable(user_id).await {
                tracing::warn!(user_id, error = %e, "Failed to persist presence on disconnect");
            }
            tracing::info!(user_id, connection_id = %connection_id, "User disconnected");
        } else {
            tracing::debug!(connection_id = %connection_id, "Unregistered connection closed");
        }

        DisconnectOutcome {
            user_id,
            left_groups,
        }
    }

    /// Send the current snapshot to every attached connection, unless a
    /// snapshot at least this recent already went out. Returns whether a
    /// broadcast was sent.
    pub fn broadcast_snapshot(&self) -> bool {
        let mut last = self.last_broadcast.lock();
        let snapshot = self.registry.snapshot();
        if matches!(*last, Some(sent) if sent >= snapshot.version) {
            return false;
        }
        *last = Some(snapshot.version);

        let user_count = snapshot.users.len();
        let reached = self
            .registry
            .broadcast(&ServerEvent::ActiveUsers(snapshot.users));
        tracing::debug!(
            version = snapshot.version,
            users = user_count,
            reached,
            "Presence snapshot broadcast"
        );
        true
    }

    /// Bring the durable presence of `user_id` in line with the registry.
    pub async fn sync_durable(&self, user_id: i64) -> Result<(), AppError> {
        let lock = self.write_locks.entry(user_id).or_default().clone();
        let result = {
            let _guard = lock.lock().await;
            let update = PresenceUpdate::now(self.registry.is_online(user_id));
            let result = self.users.update_presence(user_id, update).await;
            metrics::record_presence_write(result.is_ok());
            self.mirror_presence(user_id, update).await;
            result
        };
        // Map entry plus our clone: nobody else is waiting.
        self.write_locks
            .remove_if(&user_id, |_, l| Arc::strong_count(l) == 2);
        result
    }

    /// Re-mark every online user in the mirror so their keys do not expire.
    pub async fn refresh_mirror(&self) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let now = chrono::Utc::now();
        for user_id in self.registry.online_user_ids() {
            if let Err(e) = mirror.mark_online(user_id, now).await {
                tracing::warn!(user_id, error = %e, "Failed to refresh mirrored presence");
                break;
            }
        }
    }

    async fn mirror_presence(&self, user_id: i64, update: PresenceUpdate) {
        let Some(mirror) = &self.mirror else {
            return;
        };
        let result = if update.is_active {
            mirror.mark_online(user_id, update.last_active).await
        } else {
            mirror.mark_offline(user_id).await
        };
        if let Err(e) = result {
            tracing::warn!(user_id, error = %e, "Failed to mirror presence");
        }
    }

    fn update_gauges(&self) {
        metrics::set_realtime_gauges(
            self.registry.connection_count(),
            self.registry.online_user_count(),
        );
    }
}
