//! # Social Server Library
//!
//! Presence tracking and real-time message routing for a social app:
//! - Connection registry mapping live connections to authenticated users
//! - Presence synchronization with broadcast snapshots and durable flags
//! - Direct and group message routing with push fallback for offline users
//! - WebSocket gateway and a small REST surface
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Durable records and collaborator traits
//! - **Application Layer**: Realtime state, services and DTOs
//! - **Infrastructure Layer**: PostgreSQL, Redis, FCM and metrics
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! social_server/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, and traits
//! +-- application/    Registry, overlay, services and DTOs
//! +-- infrastructure/ Database, cache, push and metrics
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Common utilities (errors, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
