//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL)
//! - Presence mirror (Redis)
//! - Push notification gateway (FCM over HTTP)
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod metrics;
pub mod push;
pub mod repositories;
