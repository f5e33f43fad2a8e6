//! In-process document store.
//!
//! Holds both collections in memory with:
//! - all-or-nothing writes (mutations run on a copy that replaces the live
//!   dataset only when every op succeeded)
//! - one broadcast channel per collection, carrying full snapshots
//! - optional JSON persistence with atomic writes (tmp file, fsync, rename)
//! - a connectivity switch so callers can exercise failure paths

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::{
    BatchOp, ChangeEvent, Collection, ColumnUpdate, DocumentStore, StoreError, Subscription,
    TaskUpdate, WriteBatch,
};
use crate::types::{sort_columns, sort_tasks, Column, Task, TaskDraft};

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Dataset {
    #[serde(default)]
    tasks: BTreeMap<String, Task>,
    #[serde(default)]
    columns: BTreeMap<String, Column>,
}

impl Dataset {
    fn task_snapshot(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        sort_tasks(&mut tasks);
        tasks
    }

    fn column_snapshot(&self) -> Vec<Column> {
        let mut columns: Vec<Column> = self.columns.values().cloned().collect();
        sort_columns(&mut columns);
        columns
    }

    fn apply_task_update(&mut self, id: &str, update: TaskUpdate) -> Result<(), StoreError> {
        let task = self.tasks.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: Collection::Tasks,
            id: id.to_string(),
        })?;
        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        Ok(())
    }

    fn apply_column_update(&mut self, id: &str, update: ColumnUpdate) -> Result<(), StoreError> {
        let column = self.columns.get_mut(id).ok_or_else(|| StoreError::NotFound {
            collection: Collection::Columns,
            id: id.to_string(),
        })?;
        if let Some(name) = update.name {
            column.name = name;
        }
        if let Some(color) = update.color {
            column.color = color;
        }
        if let Some(position) = update.position {
            column.position = position;
        }
        Ok(())
    }
}

/// Which collections a write touched, so only those get a new snapshot.
#[derive(Debug, Clone, Copy, Default)]
struct Touched {
    tasks: bool,
    columns: bool,
}

impl Touched {
    const TASKS: Touched = Touched {
        tasks: true,
        columns: false,
    };
    const COLUMNS: Touched = Touched {
        tasks: false,
        columns: true,
    };
}

pub struct MemoryStore {
    data: RwLock<Dataset>,
    task_tx: broadcast::Sender<ChangeEvent>,
    column_tx: broadcast::Sender<ChangeEvent>,
    /// When set, every committed write is persisted here.
    data_file: Option<PathBuf>,
    online: AtomicBool,
    /// Number of successful writes (single-document or batch).
    write_count: AtomicU64,
}

impl MemoryStore {
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_dataset(Dataset::default(), None, channel_capacity)
    }

    /// Open a store persisted at `path`. A missing file starts empty.
    pub fn open(path: &Path, channel_capacity: usize) -> Result<Self, StoreError> {
        let dataset = match fs::read_to_string(path) {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => Dataset::default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("[taskboard.store] No data file at {:?}, starting empty", path);
                Dataset::default()
            }
            Err(e) => return Err(e.into()),
        };
        log::info!(
            "[taskboard.store] Loaded {} tasks and {} columns from {:?}",
            dataset.tasks.len(),
            dataset.columns.len(),
            path
        );
        Ok(Self::with_dataset(
            dataset,
            Some(path.to_path_buf()),
            channel_capacity,
        ))
    }

    fn with_dataset(dataset: Dataset, data_file: Option<PathBuf>, channel_capacity: usize) -> Self {
        let capacity = channel_capacity.max(1);
        let (task_tx, _) = broadcast::channel(capacity);
        let (column_tx, _) = broadcast::channel(capacity);
        Self {
            data: RwLock::new(dataset),
            task_tx,
            column_tx,
            data_file,
            online: AtomicBool::new(true),
            write_count: AtomicU64::new(0),
        }
    }

    /// Simulate losing or regaining the connection. While offline every
    /// read, write and subscription fails with `StoreError::Unavailable`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Push a failure onto a live query, as a broken listener would.
    pub fn report_failure(&self, collection: Collection, message: &str) {
        let event = ChangeEvent::Failed {
            collection,
            message: message.to_string(),
        };
        let _ = self.sender(collection).send(event);
    }

    fn sender(&self, collection: Collection) -> &broadcast::Sender<ChangeEvent> {
        match collection {
            Collection::Tasks => &self.task_tx,
            Collection::Columns => &self.column_tx,
        }
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("store is offline".to_string()))
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Dataset) -> R) -> Result<R, StoreError> {
        self.ensure_online()?;
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        Ok(f(&data))
    }

    /// Run `f` on a copy of the dataset; persist and publish the copy only
    /// if `f` succeeds.
    fn mutate<R>(
        &self,
        touched: Touched,
        f: impl FnOnce(&mut Dataset) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        self.ensure_online()?;
        let mut data = self.data.write().unwrap_or_else(|e| e.into_inner());
        let mut next = data.clone();
        let result = f(&mut next)?;

        if let Some(path) = &self.data_file {
            let json = serde_json::to_string_pretty(&next)?;
            atomic_write(path, &json)?;
        }

        let task_snapshot = touched.tasks.then(|| next.task_snapshot());
        let column_snapshot = touched.columns.then(|| next.column_snapshot());
        *data = next;
        self.write_count.fetch_add(1, Ordering::SeqCst);

        // Still under the write lock, so snapshots go out in commit order.
        if let Some(tasks) = task_snapshot {
            self.publish(Collection::Tasks, ChangeEvent::Tasks(tasks));
        }
        if let Some(columns) = column_snapshot {
            self.publish(Collection::Columns, ChangeEvent::Columns(columns));
        }
        drop(data);
        Ok(result)
    }

    fn publish(&self, collection: Collection, event: ChangeEvent) {
        if self.sender(collection).send(event).is_err() {
            log::trace!("[taskboard.store.send] No subscribers for {}", collection);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.read(Dataset::task_snapshot)
    }

    async fn list_columns(&self) -> Result<Vec<Column>, StoreError> {
        self.read(Dataset::column_snapshot)
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        self.read(|data| data.tasks.get(id).cloned())
    }

    async fn add_task(&self, owner_id: &str, draft: TaskDraft) -> Result<Task, StoreError> {
        let task = Task {
            id: self.new_document_id(),
            title: draft.title,
            description: draft.description,
            status: draft.status,
            created_at: Utc::now(),
            owner_id: owner_id.to_string(),
        };
        self.mutate(Touched::TASKS, |data| {
            data.tasks.insert(task.id.clone(), task.clone());
            Ok(task)
        })
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<(), StoreError> {
        self.mutate(Touched::TASKS, |data| data.apply_task_update(id, update))
    }

    async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(Touched::TASKS, |data| {
            data.tasks.remove(id);
            Ok(())
        })
    }

    async fn set_column(&self, column: Column) -> Result<(), StoreError> {
        self.mutate(Touched::COLUMNS, |data| {
            data.columns.insert(column.id.clone(), column);
            Ok(())
        })
    }

    async fn update_column(&self, id: &str, update: ColumnUpdate) -> Result<(), StoreError> {
        self.mutate(Touched::COLUMNS, |data| data.apply_column_update(id, update))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut touched = Touched::default();
        for op in batch.ops() {
            match op {
                BatchOp::DeleteTask { .. } => touched.tasks = true,
                _ => touched.columns = true,
            }
        }
        self.mutate(touched, |data| {
            for op in batch.into_ops() {
                match op {
                    BatchOp::SetColumn(column) => {
                        data.columns.insert(column.id.clone(), column);
                    }
                    BatchOp::UpdateColumn { id, update } => {
                        data.apply_column_update(&id, update)?;
                    }
                    BatchOp::DeleteColumn { id } => {
                        data.columns.remove(&id);
                    }
                    BatchOp::DeleteTask { id } => {
                        data.tasks.remove(&id);
                    }
                }
            }
            Ok(())
        })
    }

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, StoreError> {
        self.ensure_online()?;
        // Subscribe under the read lock: no write can land between the
        // initial snapshot and the receiver.
        let data = self.data.read().unwrap_or_else(|e| e.into_inner());
        let receiver = self.sender(collection).subscribe();
        let initial = match collection {
            Collection::Tasks => ChangeEvent::Tasks(data.task_snapshot()),
            Collection::Columns => ChangeEvent::Columns(data.column_snapshot()),
        };
        Ok(Subscription { initial, receiver })
    }
}

/// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let tmp_path = path.with_extension("taskboard.tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;

    // fsync directory for rename durability
    if let Some(dir) = path.parent() {
        if let Ok(d) = fs::File::open(dir) {
            let _ = d.sync_all();
        }
    }
    Ok(())
}
