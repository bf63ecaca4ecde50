//! UseCase 層のエラー定義

use thiserror::Error;

/// A client broke the session protocol
///
/// The offending event is rejected without mutating any state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// join-room while already joined
    #[error("connection is already joined to room '{0}'")]
    AlreadyJoined(String),

    /// Room-scoped event before join-room
    #[error("'{0}' requires joining a room first")]
    NotJoined(&'static str),

    /// send-message addressed to a room other than the joined one
    #[error("message addressed to room '{requested}' but connection is in room '{joined}'")]
    RoomMismatch { requested: String, joined: String },

    /// Frame could not be decoded or carried an invalid value
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl ProtocolViolation {
    /// Machine-readable code sent in the `error` event
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolViolation::AlreadyJoined(_) => "already-joined",
            ProtocolViolation::NotJoined(_) => "not-joined",
            ProtocolViolation::RoomMismatch { .. } => "room-mismatch",
            ProtocolViolation::InvalidPayload(_) => "invalid-payload",
        }
    }
}

/// Errors returned while handling one inbound event
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolViolation),

    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("membership task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
