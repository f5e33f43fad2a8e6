//! Configuration for the Taskboard backend.
//! Reads server.json from ~/.config/taskboard/server.json (or platform equivalent).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use taskboard_core::config::BoardConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Where the document store persists; in-memory only when unset.
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default)]
    pub board: BoardConfig,
    /// Log entries kept in memory for `/logs`.
    #[serde(default = "default_log_tail")]
    pub log_tail: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_tail() -> usize {
    crate::log_bridge::DEFAULT_LOG_TAIL
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            data_file: None,
            board: BoardConfig::default(),
            log_tail: default_log_tail(),
        }
    }
}

/// Default config path: ~/.config/taskboard/server.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("server.json")
}

/// Load config from path. Returns default if the file is missing or broken.
pub fn load_config(path: &Path) -> ServerConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            ServerConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            ServerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("nope.json"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert!(config.data_file.is_none());
        assert_eq!(config.log_tail, crate::log_bridge::DEFAULT_LOG_TAIL);
        assert_eq!(config.board.default_columns.len(), 5);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        fs::write(
            &path,
            r#"{"port": 9191, "dataFile": "/tmp/board.json", "logTail": 50, "board": {"dragActivationDistance": 8}}"#,
        )
        .unwrap();
        let config = load_config(&path);
        assert_eq!(config.port, 9191);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/board.json")));
        assert_eq!(config.board.drag_activation_distance, 8.0);
        assert_eq!(config.board.default_columns.len(), 5);
        assert_eq!(config.log_tail, 50);
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path).port, 8080);
    }
}
