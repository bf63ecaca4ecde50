//! Server state shared by all handlers.

use std::sync::Arc;

use crate::{
    domain::{MessagePusher, RoomRepository},
    infrastructure::{InMemoryRoomRepository, WebSocketMessagePusher},
    usecase::SessionCoordinator,
};

/// Shared application state
pub struct AppState {
    /// Room Registry（データアクセス層の抽象化）
    pub repository: Arc<dyn RoomRepository>,
    /// Routes inbound events of every connection
    pub coordinator: Arc<SessionCoordinator>,
}

impl AppState {
    /// Wire the coordinator to the given registry and channel pusher
    pub fn new(repository: Arc<dyn RoomRepository>, pusher: Arc<dyn MessagePusher>) -> Self {
        let coordinator = Arc::new(SessionCoordinator::new(repository.clone(), pusher));
        Self {
            repository,
            coordinator,
        }
    }

    /// State backed by the in-memory registry and WebSocket channels
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRoomRepository::new()),
            Arc::new(WebSocketMessagePusher::new()),
        )
    }
}
