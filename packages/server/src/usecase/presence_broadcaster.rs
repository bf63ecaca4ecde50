//! UseCase: 在室通知（参加・退出）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PresenceBroadcaster::announce_arrival() / announce_departure()
//!
//! ### なぜこのテストが必要か
//! - 通知対象が正しいこと（参加者本人を除く / 残ったメンバー全員）を保証する
//! - 他のルームへ通知が漏れないことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数メンバーへの通知
//! - エッジケース：通知対象がいない場合
//! - 異常系：一部の接続が既に閉じている場合

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, Member, MessagePusher, RoomId, RoomRepository},
    infrastructure::dto::websocket::{MemberInfo, ServerMessage},
};

use super::error::SessionError;

/// 参加・退出をルームのメンバーに通知する
///
/// Callers serialize calls together with the registry mutation that caused
/// them, so every member observes presence events in mutation order.
#[derive(Clone)]
pub struct PresenceBroadcaster {
    repository: Arc<dyn RoomRepository>,
    pusher: Arc<dyn MessagePusher>,
}

impl PresenceBroadcaster {
    pub fn new(repository: Arc<dyn RoomRepository>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self { repository, pusher }
    }

    /// `user-connected` を新メンバー以外の全メンバーへ送信
    ///
    /// # Returns
    ///
    /// 通知を送った接続数
    pub async fn announce_arrival(
        &self,
        room_id: &RoomId,
        new_member: &Member,
    ) -> Result<usize, SessionError> {
        let recipients: Vec<ConnectionId> = self
            .repository
            .snapshot_others(room_id, &new_member.connection_id)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .collect();
        let message = ServerMessage::UserConnected(MemberInfo::from(new_member)).to_json()?;

        self.deliver(&recipients, &message, "user-connected").await;
        tracing::info!(
            "Announced arrival of '{}' in room '{}' to {} member(s)",
            new_member.connection_id,
            room_id,
            recipients.len()
        );
        Ok(recipients.len())
    }

    /// `user-disconnected` を残りの全メンバーへ送信
    ///
    /// # Returns
    ///
    /// 通知を送った接続数
    pub async fn announce_departure(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
    ) -> Result<usize, SessionError> {
        let recipients: Vec<ConnectionId> = self
            .repository
            .snapshot_others(room_id, connection_id)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .collect();
        let message =
            ServerMessage::UserDisconnected(connection_id.as_str().to_string()).to_json()?;

        self.deliver(&recipients, &message, "user-disconnected").await;
        tracing::info!(
            "Announced departure of '{}' from room '{}' to {} member(s)",
            connection_id,
            room_id,
            recipients.len()
        );
        Ok(recipients.len())
    }

    async fn deliver(&self, recipients: &[ConnectionId], message: &str, event: &str) {
        if recipients.is_empty() {
            return;
        }
        for failed in self.pusher.push_to_all(recipients, message).await {
            tracing::warn!("Failed to send {} to connection '{}'", event, failed);
        }
    }
}
