//! Room listing API handlers.
//!
//! Read-only views of the registry. Playing happens over the WebSocket;
//! these endpoints only let a lobby page see which rooms are live.
//!
//! # Examples
//!
//! ```bash
//! curl http://localhost:6969/api/v1/rooms
//! curl http://localhost:6969/api/v1/rooms/lobby
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use poker_room::{game::Chips, room::RoomSummary};
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct RoomListItem {
    pub room_id: String,
    pub max_seats: usize,
    pub seats: usize,
    pub connected_seats: usize,
    pub connections: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub hand_number: u64,
    pub hand_in_progress: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl RoomListItem {
    fn from_summary(summary: RoomSummary, state: &AppState) -> Self {
        let config = state.registry.config();
        Self {
            room_id: summary.room_id,
            max_seats: config.max_seats,
            seats: summary.seats,
            connected_seats: summary.connected_seats,
            connections: summary.connections,
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            hand_number: summary.hand_number,
            hand_in_progress: summary.hand_in_progress,
        }
    }
}

/// List every live room, sorted by ID.
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomListItem>> {
    let rooms = state.registry.list_rooms().await;
    Json(
        rooms
            .into_iter()
            .map(|summary| RoomListItem::from_summary(summary, &state))
            .collect(),
    )
}

/// Describe one live room. Rooms only exist while someone is connected,
/// so an unknown ID is a 404 rather than an empty room.
pub async fn get_room(
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RoomListItem>, (StatusCode, Json<ErrorResponse>)> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Room {room_id} not found"),
            }),
        )
    };
    let handle = state.registry.get(&room_id).await.ok_or_else(not_found)?;
    let summary = handle.summary().await.map_err(|_| not_found())?;
    Ok(Json(RoomListItem::from_summary(summary, &state)))
}
