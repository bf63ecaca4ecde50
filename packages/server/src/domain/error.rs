//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConnectionId validation error
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    /// ConnectionId too long error
    #[error("ConnectionId cannot exceed {max} characters (got {actual})")]
    ConnectionIdTooLong { max: usize, actual: usize },

    /// RoomId validation error
    #[error("RoomId cannot be empty")]
    RoomIdEmpty,
}

/// Errors raised when pushing a message to a connection channel
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PushError {
    /// The target connection is not registered (never existed or already gone)
    #[error("Connection '{0}' is not connected")]
    NotConnected(String),

    /// The connection is registered but its outbound channel is closed
    #[error("Channel for connection '{0}' is closed")]
    ChannelClosed(String),
}
