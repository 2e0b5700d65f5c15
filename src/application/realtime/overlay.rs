//! Group Membership Overlay
//!
//! Live fan-out lists: which connections are watching which group. This is
//! not durable membership; callers check that before subscribing.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;

use super::connection::{ConnectionHandle, ConnectionId};
use super::events::ServerEvent;

pub struct GroupOverlay {
    /// Group ID to subscribed connections
    groups: DashMap<i64, HashMap<ConnectionId, ConnectionHandle>>,
    /// Connection ID to watched groups (for cleanup on disconnect)
    memberships: DashMap<ConnectionId, HashSet<i64>>,
}

impl GroupOverlay {
    pub fn new() -> Self {
        Self {
            groups: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Add a connection to a group's stream. Returns false if it was
    /// already subscribed.
    pub fn subscribe(&self, group_id: i64, connection: ConnectionHandle) -> bool {
        let connection_id = connection.id();
        let added = self
            .groups
            .entry(group_id)
            .or_default()
            .insert(connection_id, connection)
            .is_none();
        self.memberships
            .entry(connection_id)
            .or_default()
            .insert(group_id);

        if added {
            tracing::debug!(group_id, connection_id = %connection_id, "Subscribed to group");
        }
        added
    }

    /// Remove a connection from a group's stream. Returns false if it was
    /// not subscribed.
    pub fn unsubscribe(&self, group_id: i64, connection_id: ConnectionId) -> bool {
        let removed = self
            .groups
            .get_mut(&group_id)
            .map(|mut subscribers| subscribers.remove(&connection_id).is_some())
            .unwrap_or(false);
        self.groups.remove_if(&group_id, |_, s| s.is_empty());

        if let Some(mut groups) = self.memberships.get_mut(&connection_id) {
            groups.remove(&group_id);
        }
        self.memberships.remove_if(&connection_id, |_, g| g.is_empty());

        removed
    }

    /// Drop every subscription of a connection, returning the groups it left.
    pub fn unsubscribe_all(&self, connection_id: ConnectionId) -> Vec<i64> {
        let Some((_, groups)) = self.memberships.remove(&connection_id) else {
            return Vec::new();
        };

        let mut left: Vec<i64> = groups.into_iter().collect();
        left.sort_unstable();
        for group_id in &left {
            if let Some(mut subscribers) = self.groups.get_mut(group_id) {
                subscribers.remove(&connection_id);
            }
            self.groups.remove_if(group_id, |_, s| s.is_empty());
        }
        left
    }

    pub fn is_subscribed(&self, group_id: i64, connection_id: ConnectionId) -> bool {
        self.groups
            .get(&group_id)
            .map(|s| s.contains_key(&connection_id))
            .unwrap_or(false)
    }

    pub fn subscribers(&self, group_id: i64) -> Vec<ConnectionId> {
        self.groups
            .get(&group_id)
            .map(|s| s.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Scoped delivery to a group's subscribers. Returns how many accepted.
    pub fn publish(&self, group_id: i64, event: &ServerEvent) -> usize {
        // Clone the handles out so no shard lock is held while sending.
        let targets: Vec<ConnectionHandle> = self
            .groups
            .get(&group_id)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default();

        targets.into_iter().filter(|c| c.send(event.clone())).count()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Default for GroupOverlay {
    fn default() -> Self {
        Self::new()
    }
}
