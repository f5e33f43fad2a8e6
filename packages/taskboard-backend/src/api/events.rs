use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{sse::Event, Json, Sse},
};
use log::Level;
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream, WatchStream};
use tokio_stream::StreamExt;

use super::{api_error, ApiError};
use crate::state::AppState;

/// SSE endpoint: `board` events carry the whole snapshot (current one
/// first), `notification` events carry the toasts.
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let boards = WatchStream::new(state.board.subscribe()).filter_map(|snapshot| {
        match serde_json::to_string(&snapshot) {
            Ok(json) => Some(Ok::<_, Infallible>(Event::default().event("board").data(json))),
            Err(e) => {
                log::warn!(target: "taskboard.api.events", "Unserializable snapshot: {}", e);
                None
            }
        }
    });

    let notifications = BroadcastStream::new(state.notifications.subscribe()).filter_map(|item| {
        let notification = item.ok()?;
        let json = serde_json::to_string(&notification).ok()?;
        Some(Ok(Event::default().event("notification").data(json)))
    });

    // Keep-alive every 30 seconds
    let keep_alive = IntervalStream::new(tokio::time::interval(std::time::Duration::from_secs(30)))
        .map(|_| Ok(Event::default().comment("keep-alive")));

    Sse::new(boards.merge(notifications).merge(keep_alive))
}

pub async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.board.snapshot();
    Json(serde_json::json!({
        "status": "running",
        "port": state.port,
        "bind_address": state.bind_address,
        "ownerId": snapshot.owner_id,
        "isOnline": snapshot.is_online,
    }))
}

#[derive(Deserialize)]
pub struct LogsQuery {
    /// Least severe level to include, `trace` when absent.
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn list_logs(Query(query): Query<LogsQuery>) -> Result<Json<serde_json::Value>, ApiError> {
    let min_level = match query.level.as_deref() {
        Some(level) => level.parse::<Level>().map_err(|_| {
            api_error(
                StatusCode::BAD_REQUEST,
                "taskboard.api.logs",
                format!("Unknown log level: {}", level),
            )
        })?,
        None => Level::Trace,
    };
    Ok(Json(serde_json::json!({
        "entries": crate::log_bridge::recent_entries(min_level, query.limit),
    })))
}

pub async fn stream_logs() -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(crate::log_bridge::subscribe()).filter_map(|item| {
        let entry = item.ok()?;
        let payload = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(payload)))
    });
    Sse::new(stream)
}
