//! # Domain Entities
//!
//! Durable records the realtime core reads or writes, together with the
//! repository traits through which it reaches the persistence store.
//!
//! - **User**: presence columns (`is_active`, `last_active`)
//! - **Message**: direct or group-scoped message, immutable after creation
//! - **DeviceToken**: push token consulted when a recipient is offline
//! - **Group**: durable membership, checked before live subscription
//!
//! Repository traits are implemented in the infrastructure layer.

mod device_token;
mod group;
mod message;
mod user;

pub use device_token::{DeviceToken, DeviceTokenRepository, Platform};
pub use group::GroupRepository;
pub use message::{MediaItem, MediaKind, Message, MessageRepository, MessageTarget};
pub use user::{PresenceUpdate, User, UserRepository};

#[cfg(test)]
pub use device_token::MockDeviceTokenRepository;
#[cfg(test)]
pub use group::MockGroupRepository;
#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use user::MockUserRepository;
