//! Domain layer for the signaling server.
//!
//! This module contains the room membership model and the abstractions the
//! usecase layer depends on, independent of transport and storage concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod pusher;
pub mod repository;
pub mod value_object;

pub use entity::{Member, Room};
pub use error::{PushError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use pusher::MessagePusher;
pub use repository::RoomRepository;
pub use value_object::{ConnectionId, DisplayName, RoomId, Timestamp};

#[cfg(test)]
pub use pusher::MockMessagePusher;
