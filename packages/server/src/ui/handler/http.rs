//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use huddle_shared::time::timestamp_to_jst_rfc3339;

use crate::{
    domain::RoomId,
    infrastructure::dto::http::{MemberDetailDto, RoomDetailDto, RoomSummaryDto},
    ui::state::AppState,
};

/// Liveness text for plain GET /
pub async fn root() -> &'static str {
    "Server is running"
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of active rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.repository.list_rooms().await;

    let summaries = rooms
        .into_iter()
        .map(|room| RoomSummaryDto {
            id: room.id.into_string(),
            members: room
                .members
                .iter()
                .map(|m| m.connection_id.as_str().to_string())
                .collect(),
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        })
        .collect();

    Json(summaries)
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::NOT_FOUND)?;
    let room = state
        .repository
        .get_room(&room_id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    let room_detail = RoomDetailDto {
        id: room.id.as_str().to_string(),
        members: room
            .members
            .iter()
            .map(|m| MemberDetailDto {
                id: m.connection_id.as_str().to_string(),
                username: m.display_name.as_str().to_string(),
                muted: m.muted,
                joined_at: timestamp_to_jst_rfc3339(m.joined_at.value()),
            })
            .collect(),
        created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
    };

    Ok(Json(room_detail))
}
