//! Connection channel abstraction.
//!
//! A `MessagePusher` owns the outbound half of every live connection and
//! delivers already-encoded messages to it. Enqueueing never waits on the
//! remote peer.

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{ConnectionId, PushError};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register the outbound channel of a freshly opened connection.
    async fn register(&self, connection_id: ConnectionId, sender: UnboundedSender<String>);

    /// Drop the outbound channel of a closed connection.
    async fn unregister(&self, connection_id: &ConnectionId);

    /// Enqueue `message` for one connection.
    async fn push_to(&self, target: &ConnectionId, message: &str) -> Result<(), PushError>;

    /// Enqueue `message` for each of `targets`.
    ///
    /// Returns the targets that could not be reached.
    async fn push_to_all(&self, targets: &[ConnectionId], message: &str) -> Vec<ConnectionId>;
}
