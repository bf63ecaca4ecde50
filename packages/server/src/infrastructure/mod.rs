//! Infrastructure layer: in-memory registry, connection channels and wire DTOs.

pub mod dto;
pub mod pusher;
pub mod repository;

pub use pusher::WebSocketMessagePusher;
pub use repository::InMemoryRoomRepository;
