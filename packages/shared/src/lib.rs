//! Shared utilities for Huddle binaries and crates.

pub mod logger;
pub mod time;
