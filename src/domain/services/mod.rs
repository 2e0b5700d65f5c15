//! # Domain Services
//!
//! Contracts for collaborators that are not repositories.
//!
//! - **PushGateway**: best-effort notification of offline devices
//! - **PresenceMirror**: advisory copy of live presence in a shared store

mod notification;
mod presence;

pub use notification::*;
pub use presence::*;
