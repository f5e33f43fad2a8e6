use env_logger::Logger;
use log::{Level, Log, Metadata, Record, SetLoggerError};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex};
use tokio::sync::broadcast;

pub const DEFAULT_LOG_TAIL: usize = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp_ms: u64,
    #[serde(serialize_with = "lowercase_level")]
    pub level: Level,
    pub target: String,
    pub message: String,
}

fn lowercase_level<S: serde::Serializer>(level: &Level, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&level.as_str().to_lowercase())
}

/// Bounded tail of recent entries plus a live feed for `/logs/stream`.
struct LogTail {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: AtomicUsize,
    tx: broadcast::Sender<LogEntry>,
}

impl LogTail {
    fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: AtomicUsize::new(capacity.max(1)),
            tx: broadcast::channel(256).0,
        }
    }

    fn record(&self, entry: LogEntry) {
        let capacity = self.capacity.load(Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.push_back(entry.clone());
        let excess = entries.len().saturating_sub(capacity);
        entries.drain(..excess);
        drop(entries);
        let _ = self.tx.send(entry);
    }

    fn resize(&self, capacity: usize) {
        let capacity = capacity.max(1);
        self.capacity.store(capacity, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let excess = entries.len().saturating_sub(capacity);
        entries.drain(..excess);
    }

    /// Newest `limit` entries at `min_level` or more severe, oldest first.
    fn query(&self, min_level: Level, limit: Option<usize>) -> Vec<LogEntry> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let matching: Vec<&LogEntry> = entries.iter().filter(|e| e.level <= min_level).collect();
        let skip = limit.map_or(0, |limit| matching.len().saturating_sub(limit));
        matching.into_iter().skip(skip).cloned().collect()
    }
}

static LOG_TAIL: LazyLock<LogTail> = LazyLock::new(|| LogTail::new(DEFAULT_LOG_TAIL));

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// env_logger for the terminal, plus the in-memory tail served over HTTP.
struct BridgeLogger {
    inner: Logger,
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);
        LOG_TAIL.record(LogEntry {
            timestamp_ms: now_ms(),
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the logger. Filter with RUST_LOG, `info` by default.
pub fn init() -> Result<(), SetLoggerError> {
    let logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(BridgeLogger { inner: logger }))?;
    log::set_max_level(max_level);
    Ok(())
}

/// Apply the configured tail length once the config is loaded.
pub fn set_tail_capacity(capacity: usize) {
    LOG_TAIL.resize(capacity);
}

pub fn recent_entries(min_level: Level, limit: Option<usize>) -> Vec<LogEntry> {
    LOG_TAIL.query(min_level, limit)
}

pub fn subscribe() -> broadcast::Receiver<LogEntry> {
    LOG_TAIL.tx.subscribe()
}

/// Last resort when the logger itself could not be installed.
pub fn write_fallback_line(message: &str) {
    eprintln!("[taskboard.log_bridge] {}", message);
    LOG_TAIL.record(LogEntry {
        timestamp_ms: now_ms(),
        level: Level::Error,
        target: "taskboard.log_bridge".to_string(),
        message: message.to_string(),
    });
}
