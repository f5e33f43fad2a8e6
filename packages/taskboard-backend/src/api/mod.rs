use axum::{
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Serialize;
use taskboard_core::storage::StoreError;
use taskboard_core::BoardError;

mod board;
mod columns;
mod events;
mod session;
mod tasks;

use crate::state::AppState;

/// Axum REST API routes.
///
///   GET    /status                        -> health check (+ bind info)
///   GET    /session                       -> current identity
///   POST   /session                       -> sign in
///   DELETE /session                       -> sign out
///   GET    /board                         -> board snapshot of the signed-in owner
///   GET    /events                        -> SSE stream of snapshots and notifications
///   POST   /tasks                         -> add task
///   PATCH  /tasks/:id                     -> update title / description
///   POST   /tasks/:id/move                -> move task to another status
///   DELETE /tasks/:id                     -> delete task
///   POST   /columns                       -> add column
///   PATCH  /columns/:status               -> rename column
///   DELETE /columns/:status               -> delete column and its tasks
///   PUT    /columns/:status/position      -> move column to a position
///   POST   /column-order                  -> splice-reorder by index
///   POST   /drop                          -> resolve and apply a drag drop
///   PUT    /network                       -> report connectivity
///   DELETE /error                         -> clear the board error
///   GET    /logs?level=&limit=            -> recent backend log entries
///   GET    /logs/stream                   -> SSE stream of new log entries
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(events::status))
        .route(
            "/session",
            get(session::current)
                .post(session::sign_in)
                .delete(session::sign_out),
        )
        .route("/board", get(board::get_board))
        .route("/events", get(events::sse_events))
        .route("/tasks", post(tasks::add_task))
        .route(
            "/tasks/{id}",
            axum::routing::patch(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/tasks/{id}/move", post(tasks::move_task))
        .route("/columns", post(columns::add_column))
        .route("/column-order", post(columns::reorder_columns))
        .route(
            "/columns/{status}",
            axum::routing::patch(columns::rename_column).delete(columns::delete_column),
        )
        .route("/columns/{status}/position", put(columns::update_position))
        .route("/drop", post(board::drop_item))
        .route("/network", put(board::set_network))
        .route("/error", axum::routing::delete(board::clear_error))
        .route("/logs", get(events::list_logs))
        .route("/logs/stream", get(events::stream_logs))
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}

fn api_error(status: StatusCode, target: &'static str, error: String) -> ApiError {
    log_api_issue(status, target, &error);
    (status, Json(ErrorResponse { error }))
}

fn board_status(err: &BoardError) -> StatusCode {
    match err {
        BoardError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        BoardError::InvalidTitle | BoardError::InvalidColumnName | BoardError::Sequence(_) => {
            StatusCode::BAD_REQUEST
        }
        BoardError::ColumnNotFound(_)
        | BoardError::TaskNotFound(_)
        | BoardError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
        BoardError::StatusCollision { .. } => StatusCode::CONFLICT,
        BoardError::Store(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Map a board failure onto an HTTP error and log it under `target`.
fn board_error(target: &'static str, err: BoardError) -> ApiError {
    api_error(board_status(&err), target, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_app;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use taskboard_core::auth::AuthSession;
    use taskboard_core::config::BoardConfig;
    use taskboard_core::notify::ChannelNotifier;
    use taskboard_core::storage::memory::MemoryStore;
    use taskboard_core::BoardState;
    use tower::ServiceExt;

    fn test_state() -> (Arc<MemoryStore>, AppState) {
        let store = Arc::new(MemoryStore::new(64));
        let notifications = Arc::new(ChannelNotifier::new(64));
        let board = Arc::new(BoardState::new(
            store.clone(),
            notifications.clone(),
            &BoardConfig::default(),
        ));
        let state = AppState {
            board,
            auth: Arc::new(AuthSession::new(notifications.clone())),
            notifications,
            port: 0,
            bind_address: "127.0.0.1".into(),
        };
        (store, state)
    }

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = build_app(state.clone())
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(board_status(&BoardError::NotAuthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(board_status(&BoardError::InvalidTitle), StatusCode::BAD_REQUEST);
        assert_eq!(
            board_status(&BoardError::StatusCollision {
                status: "todo".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            board_status(&BoardError::Store(StoreError::Unavailable("down".into()))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_requires_sign_in() {
        let (_, state) = test_state();
        let (status, json) = send(
            &state,
            "POST",
            "/tasks",
            Some(serde_json::json!({"title": "x", "status": "todo"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "User not authenticated");
    }

    #[tokio::test]
    async fn test_task_and_column_flow() {
        let (_, state) = test_state();
        state.board.attach("u1").await.unwrap();

        let (status, task) = send(
            &state,
            "POST",
            "/tasks",
            Some(serde_json::json!({"title": "Write docs", "status": "todo"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["ownerId"], "u1");
        let id = task["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &state,
            "POST",
            &format!("/tasks/{}/move", id),
            Some(serde_json::json!({"status": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, column) = send(
            &state,
            "POST",
            "/columns",
            Some(serde_json::json!({"name": "Code Review"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(column["status"], "code-review");
        assert_eq!(column["position"], 5);

        let (status, _) = send(
            &state,
            "POST",
            "/columns",
            Some(serde_json::json!({"name": "code   review"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, removal) = send(&state, "DELETE", "/columns/done", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removal["removedTasks"], 1);

        let (status, _) = send(
            &state,
            "POST",
            "/column-order",
            Some(serde_json::json!({"sourceIndex": 0, "destinationIndex": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_any_column_name_stays_addressable() {
        let (_, state) = test_state();
        state.board.attach("u1").await.unwrap();

        let (status, column) = send(
            &state,
            "POST",
            "/columns",
            Some(serde_json::json!({"name": "Reorder"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(column["status"], "reorder");

        let (status, _) = send(
            &state,
            "PATCH",
            "/columns/reorder",
            Some(serde_json::json!({"name": "Renamed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &state,
            "PUT",
            "/columns/reorder/position",
            Some(serde_json::json!({"position": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, removal) = send(&state, "DELETE", "/columns/reorder", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removal["column"]["name"], "Renamed");

        let (status, json) = send(
            &state,
            "POST",
            "/column-order",
            Some(serde_json::json!({"sourceIndex": 4, "destinationIndex": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["changed"], true);
    }

    #[tokio::test]
    async fn test_logs_rejects_unknown_level() {
        let (_, state) = test_state();
        let (status, json) = send(&state, "GET", "/logs?level=warn&limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["entries"].is_array());
        let (status, _) = send(&state, "GET", "/logs?level=loud", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_store_outage_is_bad_gateway() {
        let (store, state) = test_state();
        state.board.attach("u1").await.unwrap();
        store.set_online(false);
        let (status, _) = send(
            &state,
            "PUT",
            "/columns/todo/position",
            Some(serde_json::json!({"position": 2})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, board) = send(&state, "GET", "/board", None).await;
        assert!(board["error"].is_string());
        let (status, _) = send(&state, "DELETE", "/error", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(state.board.snapshot().error.is_none());
    }

    #[tokio::test]
    async fn test_session_endpoints() {
        let (_, state) = test_state();
        let (status, _) = send(&state, "POST", "/session", Some(serde_json::json!({"id": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(
            &state,
            "POST",
            "/session",
            Some(serde_json::json!({"id": "u1", "email": "ada@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["greeting"], "ada");

        let (_, json) = send(&state, "GET", "/session", None).await;
        assert_eq!(json["identity"]["id"], "u1");

        let (_, json) = send(&state, "DELETE", "/session", None).await;
        assert_eq!(json["signedOut"], true);
    }

    #[tokio::test]
    async fn test_drop_moves_task() {
        let (_, state) = test_state();
        state.board.attach("u1").await.unwrap();
        let task = state.board.add_task("Drag me", "", "todo").await.unwrap();

        let (status, json) = send(
            &state,
            "POST",
            "/drop",
            Some(serde_json::json!({
                "active": {"type": "task", "id": task.id, "status": "todo"},
                "over": {"type": "column", "status": "feedback"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["dispatched"], true);

        let (_, json) = send(
            &state,
            "POST",
            "/drop",
            Some(serde_json::json!({
                "active": {"type": "column", "status": "todo"},
                "over": null
            })),
        )
        .await;
        assert_eq!(json["dispatched"], false);
    }
}
