use axum::{extract::State, http::StatusCode, response::Json};
use taskboard_core::auth::Identity;

use super::{api_error, ApiError};
use crate::state::AppState;

pub async fn current(State(state): State<AppState>) -> Json<serde_json::Value> {
    let identity = state.auth.current();
    let greeting = identity.as_ref().map(Identity::greeting_name);
    Json(serde_json::json!({
        "identity": identity,
        "greeting": greeting,
    }))
}

/// The board follows the session and attaches in the background.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(identity): Json<Identity>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let identity = state.auth.sign_in(identity).map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            "taskboard.api.sign_in",
            e.to_string(),
        )
    })?;
    Ok(Json(serde_json::json!({
        "greeting": identity.greeting_name(),
        "identity": identity,
    })))
}

pub async fn sign_out(State(state): State<AppState>) -> Json<serde_json::Value> {
    let previous = state.auth.sign_out();
    Json(serde_json::json!({ "signedOut": previous.is_some() }))
}
