use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use taskboard_core::types::{Column, NewColumn, COLUMN_PALETTE};

use super::{board_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddColumnBody {
    name: String,
    /// Palette token; the first palette entry when omitted.
    #[serde(default)]
    color: Option<String>,
}

#[derive(Deserialize)]
pub struct RenameColumnBody {
    name: String,
}

#[derive(Deserialize)]
pub struct PositionBody {
    position: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBody {
    source_index: usize,
    destination_index: usize,
}

pub async fn add_column(
    State(state): State<AppState>,
    Json(body): Json<AddColumnBody>,
) -> Result<(StatusCode, Json<Column>), ApiError> {
    let color = body
        .color
        .unwrap_or_else(|| COLUMN_PALETTE[0].1.to_string());
    let column = state
        .board
        .add_column(NewColumn {
            name: body.name,
            color,
        })
        .await
        .map_err(|e| board_error("taskboard.api.add_column", e))?;
    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn rename_column(
    State(state): State<AppState>,
    Path(status): Path<String>,
    Json(body): Json<RenameColumnBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .board
        .rename_column(&status, &body.name)
        .await
        .map_err(|e| board_error("taskboard.api.rename_column", e))?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_column(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removal = state
        .board
        .delete_column(&status)
        .await
        .map_err(|e| board_error("taskboard.api.delete_column", e))?;
    Ok(Json(serde_json::json!({
        "success": true,
        "column": removal.column,
        "removedTasks": removal.removed_tasks,
        "renumbered": removal.renumbered,
    })))
}

pub async fn update_position(
    State(state): State<AppState>,
    Path(status): Path<String>,
    Json(body): Json<PositionBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let changed = state
        .board
        .update_column_position(&status, body.position)
        .await
        .map_err(|e| board_error("taskboard.api.update_column_position", e))?;
    Ok(Json(serde_json::json!({ "success": true, "changed": changed })))
}

pub async fn reorder_columns(
    State(state): State<AppState>,
    Json(body): Json<ReorderBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let changed = state
        .board
        .reorder_columns(body.source_index, body.destination_index)
        .await
        .map_err(|e| board_error("taskboard.api.reorder_columns", e))?;
    Ok(Json(serde_json::json!({ "success": true, "changed": changed })))
}
