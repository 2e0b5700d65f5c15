//! Realtime State
//!
//! Process-wide, in-memory state of the realtime core. Nothing here is
//! persisted: a restart drops every registration and subscription, and
//! clients reconnect and re-announce.
//!
//! - [`ConnectionRegistry`]: user identity to live connections
//! - [`GroupOverlay`]: group to subscribed connections
//! - [`ServerEvent`]: everything the server pushes to clients

pub mod connection;
pub mod events;
pub mod overlay;
pub mod registry;

pub use connection::{ConnectionHandle, ConnectionId};
pub use events::{
    ActiveUser, DirectMessageEvent, ErrorEvent, GroupMessageEvent, GroupNotice, MessageAck,
    ServerEvent,
};
pub use overlay::GroupOverlay;
pub use registry::{
    ConnectionRegistry, PresenceSnapshot, RegisterOutcome, Registration, RegistrationPolicy,
    DEFAULT_REGISTRATION_POLICY,
};
