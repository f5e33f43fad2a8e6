use axum::{extract::State, response::Json};
use serde::Deserialize;
use taskboard_core::drag::{resolve_drop, DragItem};
use taskboard_core::BoardSnapshot;

use super::{board_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DropBody {
    active: DragItem,
    /// Nothing under the pointer on release.
    #[serde(default)]
    over: Option<DragItem>,
}

#[derive(Deserialize)]
pub struct NetworkBody {
    online: bool,
}

pub async fn get_board(State(state): State<AppState>) -> Json<BoardSnapshot> {
    Json(state.board.snapshot())
}

/// Resolve a finished drag against the current columns and apply it.
pub async fn drop_item(
    State(state): State<AppState>,
    Json(body): Json<DropBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Some(over) = body.over else {
        return Ok(Json(serde_json::json!({ "dispatched": false })));
    };
    let columns = state.board.snapshot().columns;
    let Some(intent) = resolve_drop(&body.active, &over, &columns) else {
        return Ok(Json(serde_json::json!({ "dispatched": false })));
    };
    state
        .board
        .dispatch(intent)
        .await
        .map_err(|e| board_error("taskboard.api.drop", e))?;
    Ok(Json(serde_json::json!({ "dispatched": true })))
}

pub async fn set_network(
    State(state): State<AppState>,
    Json(body): Json<NetworkBody>,
) -> Json<serde_json::Value> {
    log::info!(target: "taskboard.api.network", "Client reports online={}", body.online);
    state.board.set_online_status(body.online);
    Json(serde_json::json!({ "isOnline": body.online }))
}

pub async fn clear_error(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.board.clear_error();
    Json(serde_json::json!({ "success": true }))
}
