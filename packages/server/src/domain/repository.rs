//! Room Registry abstraction.
//!
//! The registry is the sole owner and mutator of room membership. Every read
//! returns an owned snapshot, never a reference into live state.

use async_trait::async_trait;

use super::{ConnectionId, DisplayName, Member, Room, RoomId};

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Append a new unmuted member to `room_id`, creating the room if absent.
    ///
    /// Not idempotent: joining twice without leaving yields two entries.
    /// Callers guarantee at most one join per connection.
    async fn join(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        display_name: DisplayName,
    ) -> Member;

    /// Remove the member owned by `connection_id` from `room_id`.
    ///
    /// Deletes the room when it becomes empty. Returns `false` when the
    /// connection was not a member.
    async fn leave(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool;

    /// Members of `room_id` except `exclude`, in join order.
    async fn snapshot_others(&self, room_id: &RoomId, exclude: &ConnectionId) -> Vec<Member>;

    /// All members of `room_id`, in join order.
    async fn snapshot_members(&self, room_id: &RoomId) -> Vec<Member>;

    /// Reverse lookup of the room a connection currently belongs to.
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    async fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    /// Snapshot of every room, ordered by room id.
    async fn list_rooms(&self) -> Vec<Room>;
}
