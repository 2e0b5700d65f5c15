//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! - **Identity**: authenticated `{user_id, username}` pair

mod identity;

pub use identity::*;
