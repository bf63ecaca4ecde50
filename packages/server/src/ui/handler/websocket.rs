//! WebSocket connection handlers.
//!
//! This is the Channel Transport: it accepts a connection, frames messages,
//! and triggers the disconnect transition exactly once when the socket goes
//! away for any reason.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    let connection_id = ConnectionIdFactory::generate().map_err(|e| {
        tracing::error!("Failed to generate connection id: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, connection_id: ConnectionId) {
    let (mut sender, mut receiver) = socket.split();

    // Outbound queue for this connection, drained by the send task
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let mut session = match state.coordinator.connect(connection_id.clone(), tx).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Failed to open session for '{}': {}", connection_id, e);
            return;
        }
    };

    // Spawn a task to write queued messages to this client
    let send_connection_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(msg.into())).await {
                tracing::warn!("Failed to write to '{}': {}", send_connection_id, e);
                break;
            }
        }
    });

    // The receive loop stays on this task so it can own the session. Only the
    // wait for the next frame races the send task; an event already being
    // handled always runs to completion.
    let coordinator = state.coordinator.clone();
    loop {
        let next = tokio::select! {
            next = receiver.next() => next,
            _ = &mut send_task => break,
        };
        let msg = match next {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                tracing::debug!("Received from '{}': {}", connection_id, text.as_str());
                coordinator.dispatch(&mut session, text.as_str()).await;
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection_id);
                break;
            }
            // Ping/pong is handled by the WebSocket protocol; binary frames are not part of it
            _ => {}
        }
    }

    send_task.abort();
    coordinator.disconnect(&mut session).await;
}
