//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **UserRepository** - Presence columns of user accounts
//! - **MessageRepository** - Direct and group message inserts
//! - **DeviceTokenRepository** - Push tokens for offline recipients
//! - **GroupRepository** - Durable group membership checks
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{PgMessageRepository, PgUserRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let user_repo = PgUserRepository::new(pool.clone());
//!     let message_repo = PgMessageRepository::new(pool);
//! }
//! ```

pub mod device_token_repository;
pub mod group_repository;
pub mod message_repository;
pub mod user_repository;

pub use device_token_repository::PgDeviceTokenRepository;
pub use group_repository::PgGroupRepository;
pub use message_repository::PgMessageRepository;
pub use user_repository::PgUserRepository;
