//! WebSocket message DTOs for the signaling protocol.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::Member;

/// Negotiation message kinds relayed between two connections
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        }
    }
}

/// Offer / answer / ICE candidate payload
///
/// Only `target` is interpreted; every other field is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    /// Connection id of the addressed peer
    pub target: String,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
    #[serde(alias = "displayName", default)]
    pub username: String,
}

/// Chat message sent by a client
///
/// `roomId` and `username` are optional; the server uses the session's room
/// and the display name registered at join time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    #[serde(default)]
    pub room_id: Option<String>,
    pub message: String,
    #[serde(alias = "displayName", default)]
    pub username: Option<String>,
}

/// Events sent from a client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinRoom(JoinRoomPayload),
    LeaveRoom,
    Offer(SignalPayload),
    Answer(SignalPayload),
    IceCandidate(SignalPayload),
    SendMessage(SendMessagePayload),
}

impl ClientEvent {
    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom(_) => "join-room",
            ClientEvent::LeaveRoom => "leave-room",
            ClientEvent::Offer(_) => SignalKind::Offer.as_str(),
            ClientEvent::Answer(_) => SignalKind::Answer.as_str(),
            ClientEvent::IceCandidate(_) => SignalKind::IceCandidate.as_str(),
            ClientEvent::SendMessage(_) => "send-message",
        }
    }
}

/// Member as seen by other clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub id: String,
    pub username: String,
    pub muted: bool,
}

impl From<&Member> for MemberInfo {
    fn from(member: &Member) -> Self {
        Self {
            id: member.connection_id.as_str().to_string(),
            username: member.display_name.as_str().to_string(),
            muted: member.muted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectedPayload {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveMessagePayload {
    pub message: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

/// Events sent from the server to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Server-assigned connection id, sent once when the channel opens
    Connected(ConnectedPayload),
    /// Existing roster, sent once right after join
    AllUsers(Vec<MemberInfo>),
    UserConnected(MemberInfo),
    /// Bare connection id of the departed member
    UserDisconnected(String),
    Offer(SignalPayload),
    Answer(SignalPayload),
    IceCandidate(SignalPayload),
    ReceiveMessage(ReceiveMessagePayload),
    Error(ErrorPayload),
}

impl ServerMessage {
    /// Tag a negotiation payload with its kind
    pub fn signal(kind: SignalKind, payload: SignalPayload) -> Self {
        match kind {
            SignalKind::Offer => ServerMessage::Offer(payload),
            SignalKind::Answer => ServerMessage::Answer(payload),
            SignalKind::IceCandidate => ServerMessage::IceCandidate(payload),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
