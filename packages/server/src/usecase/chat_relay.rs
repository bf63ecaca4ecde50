//! UseCase: ルーム内チャット中継
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ChatRelay::broadcast() メソッド
//!
//! ### なぜこのテストが必要か
//! - 送信者を含むルームの全メンバーに届くことを保証する（送信者へのエコーは意図的）
//! - 他のルームに漏れないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数メンバーへの配信
//! - エッジケース：存在しないルーム

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, DisplayName, MessagePusher, RoomId, RoomRepository},
    infrastructure::dto::websocket::{ReceiveMessagePayload, ServerMessage},
};

use super::error::SessionError;

/// チャットメッセージをルームの全メンバーに配信する
///
/// No history is kept and no size limit is applied. The coordinator calls
/// this under its presence lock, so the audience never includes a member that
/// has not yet received its roster.
pub struct ChatRelay {
    repository: Arc<dyn RoomRepository>,
    pusher: Arc<dyn MessagePusher>,
}

impl ChatRelay {
    pub fn new(repository: Arc<dyn RoomRepository>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self { repository, pusher }
    }

    /// `receive-message` を送信者を含むルームの全メンバーへ送信
    ///
    /// # Returns
    ///
    /// 配信対象の接続数
    pub async fn broadcast(
        &self,
        room_id: &RoomId,
        sender_display_name: &DisplayName,
        message: String,
    ) -> Result<usize, SessionError> {
        let recipients: Vec<ConnectionId> = self
            .repository
            .snapshot_members(room_id)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .collect();
        if recipients.is_empty() {
            return Ok(0);
        }

        let encoded = ServerMessage::ReceiveMessage(ReceiveMessagePayload {
            message,
            username: sender_display_name.as_str().to_string(),
        })
        .to_json()?;

        for failed in self.pusher.push_to_all(&recipients, &encoded).await {
            tracing::warn!("Failed to send message to connection '{}'", failed);
        }
        tracing::debug!(
            "Relayed message from '{}' to {} member(s) of room '{}'",
            sender_display_name,
            recipients.len(),
            room_id
        );
        Ok(recipients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::MockMessagePusher,
        infrastructure::{InMemoryRoomRepository, WebSocketMessagePusher},
    };
    use tokio::sync::mpsc;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn name(name: &str) -> DisplayName {
        DisplayName::new(name.to_string())
    }

    #[tokio::test]
    async fn test_broadcast_includes_sender_and_stays_in_room() {
        // テスト項目: 送信者を含むルームの全メンバーに届き、他のルームには届かない
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let pusher = Arc::new(WebSocketMessagePusher::new());
        let mut receivers = Vec::new();
        for id in ["B", "C", "D"] {
            let (tx, rx) = mpsc::unbounded_channel();
            pusher.register(conn(id), tx).await;
            receivers.push(rx);
        }
        repository.join(room("r1"), conn("B"), name("bob")).await;
        repository.join(room("r1"), conn("C"), name("carol")).await;
        repository.join(room("r2"), conn("D"), name("dave")).await;
        let relay = ChatRelay::new(repository.clone(), pusher.clone());

        // when (操作):
        let count = relay
            .broadcast(&room("r1"), &name("bob"), "hi".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(count, 2);
        let expected = ServerMessage::ReceiveMessage(ReceiveMessagePayload {
            message: "hi".to_string(),
            username: "bob".to_string(),
        });
        for rx in receivers.iter_mut().take(2) {
            let raw = rx.try_recv().unwrap();
            assert_eq!(serde_json::from_str::<ServerMessage>(&raw).unwrap(), expected);
        }
        assert!(receivers[2].try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_to_missing_room() {
        // テスト項目: 存在しないルームへの配信は何も送らない
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::new());
        let mut pusher = MockMessagePusher::new();
        pusher.expect_push_to_all().times(0);
        let relay = ChatRelay::new(repository, Arc::new(pusher));

        // when (操作):
        let count = relay
            .broadcast(&room("ghost"), &name("bob"), "anyone?".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(count, 0);
    }
}
