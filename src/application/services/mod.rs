//! Application Services
//!
//! Coordinate the realtime state with durable storage and outside
//! collaborators.
//!
//! ## Available Services
//!
//! - **Auth**: bearer token verification
//! - **PresenceService**: registration, disconnect, snapshot broadcast, durable presence
//! - **MessageRouter**: persist-then-deliver for direct and group messages, push fallback
//! - **MessageHistoryService**: paged conversation and inbox reads
//! - **GroupService**: membership-checked join/leave on the live overlay

pub mod auth_service;
pub mod group_service;
pub mod message_history;
pub mod message_router;
pub mod presence_service;

pub use auth_service::{AuthError, Claims, JwtVerifier, TokenVerifier};
pub use group_service::{GroupError, GroupService};
pub use message_history::{HistoryPage, MessageHistoryService};
pub use message_router::{
    DeliveryOutcome, DirectDelivery, GroupDelivery, MessageRouter, RouterError,
    DEFAULT_MAX_CONTENT_LENGTH, MAX_MEDIA_ITEMS,
};
pub use presence_service::{DisconnectOutcome, PresenceError, PresenceService};
