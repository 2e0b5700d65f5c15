//! Live connection handles.

use tokio::sync::mpsc;
use uuid::Uuid;

use super::events::ServerEvent;

/// Opaque identifier of one live connection.
pub type ConnectionId = Uuid;

/// Sending half of a live connection.
///
/// The socket task owns the receiving half and forwards events to the wire;
/// once it exits, sends on every clone of the handle start failing.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    pub fn new(sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self::with_id(Uuid::new_v4(), sender)
    }

    pub fn with_id(id: ConnectionId, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self { id, sender }
    }

    /// New handle plus the receiver its events arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event for this connection. Returns false if the socket task
    /// has already gone away.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
