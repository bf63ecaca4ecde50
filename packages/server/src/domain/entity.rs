//! Core domain models for rooms and their members.

use serde::{Deserialize, Serialize};

use super::value_object::{ConnectionId, DisplayName, RoomId, Timestamp};

/// A connection's presence record within one room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Connection that owns this membership
    pub connection_id: ConnectionId,
    /// Name shown to the other members
    pub display_name: DisplayName,
    /// UI hint only; not enforced by the server
    pub muted: bool,
    /// Timestamp when the member joined the room
    pub joined_at: Timestamp,
}

impl Member {
    /// Create a new, unmuted member
    pub fn new(connection_id: ConnectionId, display_name: DisplayName, joined_at: Timestamp) -> Self {
        Self {
            connection_id,
            display_name,
            muted: false,
            joined_at,
        }
    }
}

/// A named group of connections sharing presence and chat scope
///
/// Members are kept in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Room identifier
    pub id: RoomId,
    /// Members currently in the room, in join order
    pub members: Vec<Member>,
    /// Timestamp when the room was created
    pub created_at: Timestamp,
}

impl Room {
    /// Create a new empty room with the given ID and creation timestamp
    pub fn new(id: RoomId, created_at: Timestamp) -> Self {
        Self {
            id,
            members: Vec::new(),
            created_at,
        }
    }

    /// Append a member at the end of the join order
    pub fn add_member(&mut self, member: Member) {
        self.members.push(member);
    }

    /// Remove the member owned by `connection_id`
    ///
    /// Returns `false` when no such member exists.
    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        match self
            .members
            .iter()
            .position(|m| &m.connection_id == connection_id)
        {
            Some(index) => {
                self.members.remove(index);
                true
            }
            None => false,
        }
    }

    /// Members other than `exclude`, in join order
    pub fn members_except(&self, exclude: &ConnectionId) -> Vec<Member> {
        self.members
            .iter()
            .filter(|m| &m.connection_id != exclude)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
