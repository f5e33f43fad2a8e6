//! Taskboard backend: config loading, store init, board wiring, HTTP server.

pub mod api;
mod config;
mod log_bridge;
mod server;
pub mod state;

use crate::state::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use taskboard_core::auth::AuthSession;
use taskboard_core::notify::ChannelNotifier;
use taskboard_core::storage::memory::MemoryStore;
use taskboard_core::BoardState;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = log_bridge::init() {
        log_bridge::write_fallback_line(&format!("failed to initialize backend logger: {}", e));
    }

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path);
    log_bridge::set_tail_capacity(config.log_tail);

    let capacity = config.board.channel_capacity;
    let store = match &config.data_file {
        Some(path) => Arc::new(MemoryStore::open(path, capacity)?),
        None => {
            log::info!(target: "taskboard.store", "No data file configured, keeping the board in memory");
            Arc::new(MemoryStore::new(capacity))
        }
    };

    let notifications = Arc::new(ChannelNotifier::new(capacity));
    let auth = Arc::new(AuthSession::new(notifications.clone()));
    let board = Arc::new(BoardState::new(store, notifications.clone(), &config.board));
    let follower = board.follow(&auth);

    let state = AppState {
        board,
        auth,
        notifications,
        port: config.port,
        bind_address: config.bind_address.clone(),
    };

    let result = server::serve(state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!(target: "taskboard.server", "Failed to listen for shutdown signal: {}", e);
        }
    })
    .await;
    follower.abort();
    result
}
