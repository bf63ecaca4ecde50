//! WebRTC signaling and room relay server library.
//!
//! Clients join named rooms over WebSocket, receive the current roster, relay
//! offer/answer/ICE candidate payloads to one another, and exchange chat
//! messages scoped to their room. Media never passes through the server.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::Cli;
pub use ui::{ServerConfig, run};
