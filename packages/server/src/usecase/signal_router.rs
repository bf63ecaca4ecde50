//! UseCase: シグナリング中継（offer / answer / ICE candidate）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SignalRouter::forward() メソッド
//!
//! ### なぜこのテストが必要か
//! - ペイロードが宛先の接続にだけ、改変されずに届くことを保証する
//! - 宛先が既に切断されている場合に黙って破棄されることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：宛先への転送
//! - エッジケース：存在しない宛先、不正な宛先 ID

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, MessagePusher, PushError},
    infrastructure::dto::websocket::{ServerMessage, SignalKind, SignalPayload},
};

use super::error::SessionError;

/// 宛先指定のネゴシエーションペイロードを転送する
///
/// Forwarding ignores room membership.
pub struct SignalRouter {
    pusher: Arc<dyn MessagePusher>,
}

impl SignalRouter {
    pub fn new(pusher: Arc<dyn MessagePusher>) -> Self {
        Self { pusher }
    }

    /// `payload` を `kind` のタグ付きで宛先にそのまま転送
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 宛先のキューに積まれた
    /// * `Ok(false)` - 宛先が存在しないため破棄した
    pub async fn forward(
        &self,
        kind: SignalKind,
        payload: SignalPayload,
    ) -> Result<bool, SessionError> {
        let Ok(target) = ConnectionId::new(payload.target.clone()) else {
            tracing::debug!("Dropped {} with invalid target '{}'", kind.as_str(), payload.target);
            return Ok(false);
        };
        let message = ServerMessage::signal(kind, payload).to_json()?;

        match self.pusher.push_to(&target, &message).await {
            Ok(()) => {
                tracing::debug!("Forwarded {} to '{}'", kind.as_str(), target);
                Ok(true)
            }
            // the peer raced a disconnect; the sender learns of it through presence
            Err(PushError::NotConnected(_) | PushError::ChannelClosed(_)) => {
                tracing::debug!("Dropped {} for departed target '{}'", kind.as_str(), target);
                Ok(false)
            }
        }
    }
}
