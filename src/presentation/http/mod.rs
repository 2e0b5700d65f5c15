//! HTTP API
//!
//! REST routes, health checks and the metrics endpoint.

pub mod handlers;
pub mod routes;
