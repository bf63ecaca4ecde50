//! HTTP API response DTOs for room inspection.

use serde::{Deserialize, Serialize};

/// Room summary for list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    /// Connection ids in join order
    pub members: Vec<String>,
    pub created_at: String, // ISO 8601
}

/// Room detail for detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub members: Vec<MemberDetailDto>,
    pub created_at: String, // ISO 8601
}

/// Member detail for room detail endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDetailDto {
    pub id: String,
    pub username: String,
    pub muted: bool,
    pub joined_at: String, // ISO 8601
}
