//! WebSocket-backed MessagePusher.
//!
//! Each connection's socket task owns the receiving half of an unbounded
//! channel and writes whatever arrives to its socket; this type holds the
//! sending halves keyed by connection id.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::domain::{ConnectionId, MessagePusher, PushError};

#[derive(Debug, Default)]
pub struct WebSocketMessagePusher {
    /// Outbound channels of live connections
    connections: Mutex<HashMap<ConnectionId, UnboundedSender<String>>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register(&self, connection_id: ConnectionId, sender: UnboundedSender<String>) {
        let mut connections = self.connections.lock().await;
        if connections.insert(connection_id.clone(), sender).is_some() {
            tracing::warn!("Replaced outbound channel of connection '{}'", connection_id);
        }
    }

    async fn unregister(&self, connection_id: &ConnectionId) {
        self.connections.lock().await.remove(connection_id);
    }

    async fn push_to(&self, target: &ConnectionId, message: &str) -> Result<(), PushError> {
        let connections = self.connections.lock().await;
        let sender = connections
            .get(target)
            .ok_or_else(|| PushError::NotConnected(target.to_string()))?;
        sender
            .send(message.to_string())
            .map_err(|_| PushError::ChannelClosed(target.to_string()))
    }

    async fn push_to_all(&self, targets: &[ConnectionId], message: &str) -> Vec<ConnectionId> {
        let connections = self.connections.lock().await;
        targets
            .iter()
            .filter(|target| match connections.get(*target) {
                Some(sender) => sender.send(message.to_string()).is_err(),
                None => true,
            })
            .cloned()
            .collect()
    }
}
