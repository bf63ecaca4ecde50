//! UseCase: セッション調停（接続ごとの状態機械）
//!
//! 接続は `Connected → Joined → Closed` の順に遷移します。
//! `Joined` から `leave-room` で `Connected` に戻り、別のルームへ参加できます。
//! `Closed` からの遷移はありません。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SessionCoordinator の各イベント処理と状態遷移
//!
//! ### なぜこのテストが必要か
//! - 参加・退出時の通知が正しい相手に、正しい順序で、ちょうど一度だけ届くことを保証する
//! - プロトコル違反が状態を変更せずに拒否されることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加 → シグナリング → チャット → 切断
//! - 異常系：二重参加、参加前のイベント、ルーム不一致
//! - エッジケース：切断の多重呼び出し、参加前の切断、処理途中でのイベント処理の中断

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc::UnboundedSender};

use crate::{
    domain::{ConnectionId, DisplayName, MessagePusher, RoomId, RoomRepository},
    infrastructure::dto::websocket::{
        ClientEvent, ConnectedPayload, ErrorPayload, JoinRoomPayload, MemberInfo,
        SendMessagePayload, ServerMessage, SignalKind,
    },
};

use super::{
    chat_relay::ChatRelay,
    error::{ProtocolViolation, SessionError},
    presence_broadcaster::PresenceBroadcaster,
    signal_router::SignalRouter,
};

/// Lifecycle state of one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Channel open, not in any room
    Connected,
    /// Member of exactly one room
    Joined {
        room_id: RoomId,
        display_name: DisplayName,
    },
    /// Terminal
    Closed,
}

/// Per-connection session, owned by the connection's socket task
#[derive(Debug)]
pub struct Session {
    connection_id: ConnectionId,
    state: SessionState,
}

impl Session {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}

/// Registry mutations paired with their presence announcements
///
/// Both halves run under `lock`, so every member observes presence events in
/// mutation order. Chat snapshots take the same lock.
#[derive(Clone)]
struct Membership {
    repository: Arc<dyn RoomRepository>,
    pusher: Arc<dyn MessagePusher>,
    presence: PresenceBroadcaster,
    lock: Arc<Mutex<()>>,
}

impl Membership {
    /// Join, send the roster to the newcomer, then announce the arrival
    async fn enter(
        self,
        room_id: RoomId,
        connection_id: ConnectionId,
        display_name: DisplayName,
    ) -> Result<(), SessionError> {
        let _guard = self.lock.lock().await;
        let member = self
            .repository
            .join(room_id.clone(), connection_id.clone(), display_name)
            .await;
        tracing::info!("Connection '{}' joined room '{}'", connection_id, room_id);

        let others = self.repository.snapshot_others(&room_id, &connection_id).await;
        let all_users =
            ServerMessage::AllUsers(others.iter().map(MemberInfo::from).collect()).to_json()?;
        if let Err(e) = self.pusher.push_to(&connection_id, &all_users).await {
            tracing::warn!("Failed to send roster to '{}': {}", connection_id, e);
        }

        self.presence.announce_arrival(&room_id, &member).await?;
        Ok(())
    }

    /// Leave, then announce the departure if the connection was a member
    async fn exit(self, room_id: RoomId, connection_id: ConnectionId) -> Result<bool, SessionError> {
        let _guard = self.lock.lock().await;
        if !self.repository.leave(&room_id, &connection_id).await {
            return Ok(false);
        }
        tracing::info!("Connection '{}' left room '{}'", connection_id, room_id);
        self.presence
            .announce_departure(&room_id, &connection_id)
            .await?;
        Ok(true)
    }

    /// Run a membership change on its own task
    ///
    /// The change completes even if the caller is dropped while awaiting it,
    /// so a committed join or leave is always announced.
    async fn commit<T, F>(change: F) -> Result<T, SessionError>
    where
        F: Future<Output = Result<T, SessionError>> + Send + 'static,
        T: Send + 'static,
    {
        tokio::spawn(change).await?
    }
}

/// 受信イベントを Registry / 通知 / 中継へ振り分ける
pub struct SessionCoordinator {
    repository: Arc<dyn RoomRepository>,
    pusher: Arc<dyn MessagePusher>,
    membership: Membership,
    router: SignalRouter,
    relay: ChatRelay,
}

impl SessionCoordinator {
    pub fn new(repository: Arc<dyn RoomRepository>, pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            membership: Membership {
                repository: repository.clone(),
                pusher: pusher.clone(),
                presence: PresenceBroadcaster::new(repository.clone(), pusher.clone()),
                lock: Arc::new(Mutex::new(())),
            },
            router: SignalRouter::new(pusher.clone()),
            relay: ChatRelay::new(repository.clone(), pusher.clone()),
            repository,
            pusher,
        }
    }

    /// 新しい接続を登録し、割り当てた接続 ID を `connected` で通知する
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        sender: UnboundedSender<String>,
    ) -> Result<Session, SessionError> {
        let greeting = ServerMessage::Connected(ConnectedPayload {
            id: connection_id.as_str().to_string(),
        })
        .to_json()?;
        self.pusher.register(connection_id.clone(), sender).await;
        self.push_or_warn(&connection_id, &greeting).await;

        tracing::info!("Connection '{}' opened", connection_id);
        Ok(Session {
            connection_id,
            state: SessionState::Connected,
        })
    }

    /// 受信イベントを処理する
    ///
    /// Protocol violations are returned without any state change; see
    /// [`SessionCoordinator::dispatch`] for the variant that reports them to
    /// the client.
    pub async fn handle(
        &self,
        session: &mut Session,
        event: ClientEvent,
    ) -> Result<(), SessionError> {
        if session.is_closed() {
            tracing::debug!(
                "Ignored '{}' from closed connection '{}'",
                event.name(),
                session.connection_id
            );
            return Ok(());
        }

        match event {
            ClientEvent::JoinRoom(payload) => self.join_room(session, payload).await,
            ClientEvent::LeaveRoom => self.leave_room(session).await,
            ClientEvent::Offer(payload) => {
                self.ensure_joined(session, "offer")?;
                self.router.forward(SignalKind::Offer, payload).await?;
                Ok(())
            }
            ClientEvent::Answer(payload) => {
                self.ensure_joined(session, "answer")?;
                self.router.forward(SignalKind::Answer, payload).await?;
                Ok(())
            }
            ClientEvent::IceCandidate(payload) => {
                self.ensure_joined(session, "ice-candidate")?;
                self.router.forward(SignalKind::IceCandidate, payload).await?;
                Ok(())
            }
            ClientEvent::SendMessage(payload) => self.send_message(session, payload).await,
        }
    }

    /// Decode one text frame, handle it, and answer violations with an `error` event
    pub async fn dispatch(&self, session: &mut Session, text: &str) {
        let result = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.handle(session, event).await,
            Err(e) => Err(ProtocolViolation::InvalidPayload(e.to_string()).into()),
        };

        match result {
            Ok(()) => {}
            Err(SessionError::ProtocolViolation(violation)) => {
                tracing::warn!(
                    "Rejected event from '{}': {}",
                    session.connection_id,
                    violation
                );
                self.report_violation(&session.connection_id, &violation).await;
            }
            Err(e) => {
                tracing::error!(
                    "Failed to handle event from '{}': {}",
                    session.connection_id,
                    e
                );
            }
        }
    }

    /// 切断処理
    ///
    /// Runs the registry cleanup at most once per session, whatever number of
    /// close signals the transport produces. Membership is looked up in the
    /// registry rather than the session state, so a join whose handler was
    /// dropped half-way is still cleaned up.
    pub async fn disconnect(&self, session: &mut Session) {
        if session.is_closed() {
            return;
        }
        session.state = SessionState::Closed;

        let connection_id = &session.connection_id;
        if let Some(room_id) = self.repository.room_of(connection_id).await {
            let change = self.membership.clone().exit(room_id, connection_id.clone());
            if let Err(e) = Membership::commit(change).await {
                tracing::error!("Failed to announce departure of '{}': {}", connection_id, e);
            }
        }
        self.pusher.unregister(connection_id).await;

        tracing::info!("Connection '{}' closed", connection_id);
    }

    async fn join_room(
        &self,
        session: &mut Session,
        payload: JoinRoomPayload,
    ) -> Result<(), SessionError> {
        if let SessionState::Joined { room_id, .. } = &session.state {
            return Err(ProtocolViolation::AlreadyJoined(room_id.to_string()).into());
        }
        let room_id = RoomId::new(payload.room_id)
            .map_err(|e| ProtocolViolation::InvalidPayload(e.to_string()))?;
        let display_name = DisplayName::new(payload.username);

        session.state = SessionState::Joined {
            room_id: room_id.clone(),
            display_name: display_name.clone(),
        };
        let change = self.membership.clone().enter(
            room_id,
            session.connection_id.clone(),
            display_name,
        );
        Membership::commit(change).await
    }

    async fn leave_room(&self, session: &mut Session) -> Result<(), SessionError> {
        let SessionState::Joined { room_id, .. } = &session.state else {
            return Err(ProtocolViolation::NotJoined("leave-room").into());
        };
        let room_id = room_id.clone();
        session.state = SessionState::Connected;

        let change = self
            .membership
            .clone()
            .exit(room_id, session.connection_id.clone());
        Membership::commit(change).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        session: &Session,
        payload: SendMessagePayload,
    ) -> Result<(), SessionError> {
        let SessionState::Joined {
            room_id,
            display_name,
        } = &session.state
        else {
            return Err(ProtocolViolation::NotJoined("send-message").into());
        };
        if let Some(requested) = payload.room_id
            && requested != room_id.as_str()
        {
            return Err(ProtocolViolation::RoomMismatch {
                requested,
                joined: room_id.to_string(),
            }
            .into());
        }

        // A newcomer is either outside the audience or already holds its roster
        let _guard = self.membership.lock.lock().await;
        self.relay
            .broadcast(room_id, display_name, payload.message)
            .await?;
        Ok(())
    }

    fn ensure_joined(&self, session: &Session, event: &'static str) -> Result<(), SessionError> {
        match session.state {
            SessionState::Joined { .. } => Ok(()),
            _ => Err(ProtocolViolation::NotJoined(event).into()),
        }
    }

    async fn report_violation(&self, connection_id: &ConnectionId, violation: &ProtocolViolation) {
        let message = ServerMessage::Error(ErrorPayload {
            code: violation.code().to_string(),
            message: violation.to_string(),
        });
        match message.to_json() {
            Ok(json) => self.push_or_warn(connection_id, &json).await,
            Err(e) => tracing::error!("Failed to encode error event: {}", e),
        }
    }

    async fn push_or_warn(&self, connection_id: &ConnectionId, message: &str) {
        if let Err(e) = self.pusher.push_to(connection_id, message).await {
            tracing::warn!("Failed to send to '{}': {}", connection_id, e);
        }
    }
}
