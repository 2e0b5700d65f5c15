//! WebSocket Gateway
//!
//! Real-time communication via WebSocket connections.

pub mod handler;
pub mod messages;
pub mod session;

pub use handler::ws_handler;
pub use messages::ClientEvent;
pub use session::SessionState;
