//! Shared application state passed to axum handlers.

use std::sync::Arc;
use taskboard_core::auth::AuthSession;
use taskboard_core::notify::ChannelNotifier;
use taskboard_core::BoardState;

#[derive(Clone)]
pub struct AppState {
    pub board: Arc<BoardState>,
    pub auth: Arc<AuthSession>,
    pub notifications: Arc<ChannelNotifier>,
    pub port: u16,
    pub bind_address: String,
}
