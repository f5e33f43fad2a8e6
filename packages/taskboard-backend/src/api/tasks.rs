use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use taskboard_core::types::{Task, TaskPatch};

use super::{board_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddTaskBody {
    title: String,
    #[serde(default)]
    description: String,
    status: String,
}

#[derive(Deserialize)]
pub struct MoveTaskBody {
    status: String,
}

pub async fn add_task(
    State(state): State<AppState>,
    Json(body): Json<AddTaskBody>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state
        .board
        .add_task(&body.title, &body.description, &body.status)
        .await
        .map_err(|e| board_error("taskboard.api.add_task", e))?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .board
        .update_task(&id, patch)
        .await
        .map_err(|e| board_error("taskboard.api.update_task", e))?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn move_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<MoveTaskBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .board
        .move_task(&id, &body.status)
        .await
        .map_err(|e| board_error("taskboard.api.move_task", e))?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .board
        .delete_task(&id)
        .await
        .map_err(|e| board_error("taskboard.api.delete_task", e))?;
    Ok(Json(serde_json::json!({ "success": true })))
}
