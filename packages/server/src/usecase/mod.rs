//! UseCase 層
//!
//! シグナリングのビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層を操作します。

pub mod chat_relay;
pub mod error;
pub mod presence_broadcaster;
pub mod session_coordinator;
pub mod signal_router;

pub use chat_relay::ChatRelay;
pub use error::{ProtocolViolation, SessionError};
pub use presence_broadcaster::PresenceBroadcaster;
pub use session_coordinator::{Session, SessionCoordinator, SessionState};
pub use signal_router::SignalRouter;
