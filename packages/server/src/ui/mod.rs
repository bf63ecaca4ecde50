//! HTTP / WebSocket surface of the signaling server.

pub mod error;
mod handler;
mod runner;
mod signal;
pub mod state;

pub use error::ServerError;
pub use runner::{ServerConfig, build_router, run};
