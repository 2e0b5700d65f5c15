//! Application Layer
//!
//! The realtime core: in-memory presence state, the services that keep it in
//! step with durable storage, and the DTOs of the HTTP surface.

pub mod dto;
pub mod realtime;
pub mod services;
