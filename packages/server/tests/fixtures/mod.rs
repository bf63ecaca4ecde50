//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use huddle_server::ui::{build_router, state::AppState};
use serde_json::Value;
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// In-process server bound to an ephemeral port, stopped on drop
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let app = build_router(Arc::new(AppState::in_memory()), &["*".to_string()]);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server stopped unexpectedly");
        });

        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Open a WebSocket client and consume the `connected` greeting
    pub async fn connect(&self) -> WsClient {
        let (stream, _) = connect_async(self.ws_url())
            .await
            .expect("Failed to connect WebSocket");
        let mut client = WsClient {
            stream,
            id: String::new(),
        };
        let greeting = client.recv().await;
        assert_eq!(greeting["event"], "connected");
        client.id = greeting["data"]["id"]
            .as_str()
            .expect("connected event without id")
            .to_string();
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Server-assigned connection id
    pub id: String,
}

impl WsClient {
    pub async fn send(&mut self, frame: Value) {
        self.stream
            .send(Message::text(frame.to_string()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("Failed to send frame");
    }

    /// Next text frame as JSON; panics after a timeout
    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for a frame")
                .expect("Stream ended")
                .expect("WebSocket error");
            if let Message::Text(text) = frame {
                return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            }
        }
    }

    /// Assert that no text frame arrives within `wait`
    pub async fn expect_silence(&mut self, wait: Duration) {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Err(_) => return,
                Ok(Some(Ok(Message::Text(text)))) => {
                    panic!("Expected silence but received: {}", text.as_str())
                }
                Ok(Some(Ok(_))) => continue,
                Ok(other) => panic!("Connection ended while expecting silence: {other:?}"),
            }
        }
    }

    pub async fn join(&mut self, room_id: &str, username: &str) -> Value {
        self.send(serde_json::json!({
            "event": "join-room",
            "data": {"roomId": room_id, "username": username}
        }))
        .await;
        let roster = self.recv().await;
        assert_eq!(roster["event"], "all-users");
        roster
    }

    pub async fn close(mut self) {
        self.stream.close(None).await.expect("Failed to close");
    }

    /// Drop the TCP connection without a closing handshake
    pub fn drop_connection(self) {
        drop(self.stream);
    }
}
