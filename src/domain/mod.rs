//! # Domain Layer
//!
//! Durable records and collaborator contracts of the realtime core. It is
//! independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Users, messages, device tokens, group membership
//! - **value_objects**: Immutable value types (Identity)
//! - **services**: Non-repository collaborator contracts (PushGateway)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use value_objects::*;
