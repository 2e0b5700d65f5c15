//! Connection Registry
//!
//! Maps user identity to live connection handles and is the single source of
//! truth for "is this user reachable". Also tracks every authenticated
//! connection (registered or not) as the audience for presence broadcasts.
//!
//! All maps sit behind one lock so that a registration, its reverse index and
//! the snapshot version always change together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;

use super::connection::{ConnectionHandle, ConnectionId};
use super::events::{ActiveUser, ServerEvent};

/// How a second registration for the same user is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// One connection per user; the newest registration replaces the old one.
    SingleSlot,
    /// Every registered connection is kept; the user stays online until the
    /// last one disconnects.
    MultiDevice,
}

/// Policy used when configuration does not choose one.
pub const DEFAULT_REGISTRATION_POLICY: RegistrationPolicy = RegistrationPolicy::SingleSlot;

impl Default for RegistrationPolicy {
    fn default() -> Self {
        DEFAULT_REGISTRATION_POLICY
    }
}

/// One live registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user_id: i64,
    pub username: String,
    pub connection: ConnectionHandle,
    pub registered_at: DateTime<Utc>,
}

/// What a `register` call changed besides adding the new entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterOutcome {
    /// Connections of the same user that lost their registration
    pub superseded: Vec<ConnectionId>,
    /// Another user that was registered on this very connection and lost it
    pub displaced_user: Option<i64>,
}

/// Registered users at a given registry version.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceSnapshot {
    pub version: u64,
    pub users: Vec<ActiveUser>,
}

#[derive(Default)]
struct RegistryInner {
    /// Every attached connection, registered or not
    audience: HashMap<ConnectionId, ConnectionHandle>,
    /// Registrations per user, oldest first
    by_user: HashMap<i64, Vec<Registration>>,
    /// Reverse index used on disconnect
    by_connection: HashMap<ConnectionId, i64>,
    /// Bumped on every registration change
    version: u64,
}

impl RegistryInner {
    fn remove_registration(&mut self, connection_id: ConnectionId) -> Option<i64> {
        let user_id = self.by_connection.remove(&connection_id)?;
        let now_empty = match self.by_user.get_mut(&user_id) {
            Some(entries) => {
                entries.retain(|r| r.connection.id() != connection_id);
                entries.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_user.remove(&user_id);
        }
        self.version += 1;
        Some(user_id)
    }
}

/// In-memory registry of live connections.
pub struct ConnectionRegistry {
    policy: RegistrationPolicy,
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            policy,
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Add an authenticated connection to the broadcast audience.
    pub fn attach(&self, connection: ConnectionHandle) {
        self.inner.write().audience.insert(connection.id(), connection);
    }

    /// Register `connection` as a live endpoint for `user_id`.
    ///
    /// Re-registering the same connection refreshes its entry. Under
    /// [`RegistrationPolicy::SingleSlot`] any other registration of the same
    /// user is superseded.
    pub fn register(
        &self,
        user_id: i64,
        username: &str,
        connection: ConnectionHandle,
    ) -> RegisterOutcome {
        let connection_id = connection.id();
        let mut inner = self.inner.write();
        let mut outcome = RegisterOutcome::default();

        if let Some(previous) = inner.remove_registration(connection_id) {
            if previous != user_id {
                outcome.displaced_user = Some(previous);
            }
        }

        if self.policy == RegistrationPolicy::SingleSlot {
            if let Some(previous) = inner.by_user.remove(&user_id) {
                for registration in previous {
                    let id = registration.connection.id();
                    inner.by_connection.remove(&id);
                    outcome.superseded.push(id);
                }
            }
        }

        inner.audience.insert(connection_id, connection.clone());
        inner.by_connection.insert(connection_id, user_id);
        inner.by_user.entry(user_id).or_default().push(Registration {
            user_id,
            username: username.to_string(),
            connection,
            registered_at: Utc::now(),
        });
        inner.version += 1;

        tracing::debug!(
            user_id,
            connection_id = %connection_id,
            superseded = outcome.superseded.len(),
            "Connection registered"
        );
        outcome
    }

    /// Most recent live connection for a user. `None` means offline.
    pub fn lookup(&self, user_id: i64) -> Option<ConnectionHandle> {
        self.inner
            .read()
            .by_user
            .get(&user_id)
            .and_then(|entries| entries.last())
            .map(|r| r.connection.clone())
    }

    /// Every live registered connection for a user.
    pub fn connections_for(&self, user_id: i64) -> Vec<ConnectionHandle> {
        self.inner
            .read()
            .by_user
            .get(&user_id)
            .map(|entries| entries.iter().map(|r| r.connection.clone()).collect())
            .unwrap_or_default()
    }

    /// Remove the registration held by `connection_id`, returning its user.
    ///
    /// Idempotent: an unknown or already superseded connection is a no-op and
    /// never touches another user's entry.
    pub fn unregister(&self, connection_id: ConnectionId) -> Option<i64> {
        self.inner.write().remove_registration(connection_id)
    }

    /// Drop a connection entirely: its registration and its place in the
    /// broadcast audience.
    pub fn detach(&self, connection_id: ConnectionId) -> Option<i64> {
        let mut inner = self.inner.write();
        inner.audience.remove(&connection_id);
        inner.remove_registration(connection_id)
    }

    pub fn user_of(&self, connection_id: ConnectionId) -> Option<i64> {
        self.inner.read().by_connection.get(&connection_id).copied()
    }

    /// Every user with at least one live registration, ascending.
    pub fn online_user_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.inner.read().by_user.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_online(&self, user_id: i64) -> bool {
        self.inner.read().by_user.contains_key(&user_id)
    }

    /// Registered users ordered by username, tagged with the registry version.
    pub fn snapshot(&self) -> PresenceSnapshot {
        let inner = self.inner.read();
        let mut users: Vec<ActiveUser> = inner
            .by_user
            .values()
            .filter_map(|entries| entries.last())
            .map(|r| ActiveUser {
                user_id: r.user_id.to_string(),
                username: r.username.clone(),
                connection_details: r.connection.id().to_string(),
                last_active: r.registered_at,
            })
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username).then(a.user_id.cmp(&b.user_id)));
        PresenceSnapshot {
            version: inner.version,
            users,
        }
    }

    /// Scoped delivery to one user's registered connections. Returns how many
    /// connections accepted the event.
    pub fn send_to_user(&self, user_id: i64, event: &ServerEvent) -> usize {
        self.connections_for(user_id)
            .into_iter()
            .filter(|c| c.send(event.clone()))
            .count()
    }

    /// Deliver to a single attached connection.
    pub fn send_to_connection(&self, connection_id: ConnectionId, event: ServerEvent) -> bool {
        let handle = self.inner.read().audience.get(&connection_id).cloned();
        handle.map(|c| c.send(event)).unwrap_or(false)
    }

    /// Broadcast to every attached connection. Reserved for public data such
    /// as presence snapshots; private content goes through the scoped methods.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let audience: Vec<ConnectionHandle> =
            self.inner.read().audience.values().cloned().collect();
        audience
            .into_iter()
            .filter(|c| c.send(event.clone()))
            .count()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.read().audience.len()
    }

    pub fn online_user_count(&self) -> usize {
        self.inner.read().by_user.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRATION_POLICY)
    }
}
