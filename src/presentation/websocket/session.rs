//! WebSocket Session State

use std::time::{Duration, Instant};

use crate::application::realtime::ConnectionId;
use crate::domain::Identity;

/// Per-socket state owned by the reader loop.
#[derive(Debug)]
pub struct SessionState {
    pub connection_id: ConnectionId,
    pub identity: Identity,
    pub last_seen: Instant,
    pub frames: u64,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId, identity: Identity) -> Self {
        Self {
            connection_id,
            identity,
            last_seen: Instant::now(),
            frames: 0,
        }
    }

    /// Any inbound frame counts as activity.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
        self.frames += 1;
    }

    /// Checked on the socket loop's tick. Inbound frames are dispatched inline,
    /// so a store or push call that hangs delays the idle close until it returns.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() >= timeout
    }
}
