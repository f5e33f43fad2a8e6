//! Board aggregate state.
//!
//! One `BoardState` holds the confirmed tasks and columns of the current
//! owner. It is filled exclusively by the store's change streams; mutations
//! go straight to the repositories and show up once the store reports them.

mod session;
mod snapshot;

pub use snapshot::BoardSnapshot;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::auth::AuthSession;
use crate::config::BoardConfig;
use crate::drag::DragIntent;
use crate::error::BoardError;
use crate::notify::{Notification, Notifier};
use crate::repository::{ColumnRemoval, ColumnRepository, TaskRepository};
use crate::storage::{Collection, DocumentStore};
use crate::types::{Column, NewColumn, Task, TaskDraft, TaskPatch};
use session::{BoardSession, Forwarder};

pub struct BoardState {
    store: Arc<dyn DocumentStore>,
    tasks: TaskRepository,
    columns: ColumnRepository,
    notifier: Arc<dyn Notifier>,
    snapshot_tx: Arc<watch::Sender<BoardSnapshot>>,
    session: Mutex<Option<BoardSession>>,
    generation: AtomicU64,
}

impl BoardState {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>, config: &BoardConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(BoardSnapshot::default());
        Self {
            tasks: TaskRepository::new(Arc::clone(&store)),
            columns: ColumnRepository::new(Arc::clone(&store), config.default_columns.clone()),
            store,
            notifier,
            snapshot_tx: Arc::new(snapshot_tx),
            session: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that changes whenever the board should be re-rendered.
    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn owner(&self) -> Option<String> {
        self.snapshot_tx.borrow().owner_id.clone()
    }

    // ---- lifecycle ----

    /// Show `owner_id`'s board: drop the previous owner's data and
    /// subscriptions, seed default columns if the owner has none, then
    /// follow both collections.
    pub async fn attach(&self, owner_id: &str) -> Result<(), BoardError> {
        let mut session = self.session.lock().await;
        self.release(&mut session);

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let owner = owner_id.to_string();
        self.snapshot_tx.send_modify(|snapshot| {
            *snapshot = BoardSnapshot {
                owner_id: Some(owner),
                is_online: snapshot.is_online,
                loading: true,
                generation,
                ..BoardSnapshot::default()
            };
        });
        log::info!("[taskboard.board] Attaching board of {}", owner_id);

        match self.connect(owner_id, generation).await {
            Ok(connected) => {
                *session = Some(connected);
                Ok(())
            }
            Err(e) => {
                log::error!("[taskboard.board] Setup error for {}: {}", owner_id, e);
                let message = e.to_string();
                self.snapshot_tx.send_if_modified(|snapshot| {
                    if snapshot.generation != generation {
                        return false;
                    }
                    snapshot.error = Some(message);
                    snapshot.loading = false;
                    true
                });
                self.notifier
                    .notify(Notification::error("Error setting up board"));
                Err(e)
            }
        }
    }

    async fn connect(&self, owner_id: &str, generation: u64) -> Result<BoardSession, BoardError> {
        self.columns.seed_defaults(owner_id).await?;
        let tasks = self.store.subscribe(Collection::Tasks).await?;
        let columns = self.store.subscribe(Collection::Columns).await?;

        let forwarder = Forwarder {
            owner_id: owner_id.to_string(),
            generation,
            snapshot_tx: Arc::clone(&self.snapshot_tx),
            notifier: Arc::clone(&self.notifier),
            store: Arc::clone(&self.store),
        };
        forwarder.apply(tasks.initial);
        forwarder.apply(columns.initial);

        let mut session = BoardSession::new(owner_id);
        session.push(forwarder.clone().spawn(Collection::Tasks, tasks.receiver));
        session.push(forwarder.spawn(Collection::Columns, columns.receiver));
        Ok(session)
    }

    /// Cancel subscriptions and clear the cached board.
    pub async fn detach(&self) {
        let mut session = self.session.lock().await;
        self.release(&mut session);
    }

    fn release(&self, session: &mut Option<BoardSession>) {
        let previous = session.take();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.snapshot_tx.send_modify(|snapshot| {
            *snapshot = BoardSnapshot {
                is_online: snapshot.is_online,
                generation,
                ..BoardSnapshot::default()
            };
        });
        if let Some(previous) = previous {
            log::info!("[taskboard.board] Detached board of {}", previous.owner_id);
        }
    }

    /// Keep the board attached to whoever is signed in.
    pub fn follow(self: &Arc<Self>, auth: &AuthSession) -> JoinHandle<()> {
        let board = Arc::clone(self);
        let mut identities = auth.subscribe();
        tokio::spawn(async move {
            loop {
                let identity = identities.borrow_and_update().clone();
                match identity {
                    Some(identity) if board.owner().as_deref() != Some(identity.id.as_str()) => {
                        if let Err(e) = board.attach(&identity.id).await {
                            log::warn!("[taskboard.board] Attach for {} failed: {}", identity.id, e);
                        }
                    }
                    Some(_) => {}
                    None => {
                        if board.owner().is_some() {
                            board.detach().await;
                        }
                    }
                }
                if identities.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    // ---- shared flags ----

    pub fn set_online_status(&self, online: bool) {
        self.snapshot_tx.send_if_modified(|snapshot| {
            let changed = snapshot.is_online != online;
            snapshot.is_online = online;
            changed
        });
    }

    pub fn set_error(&self, error: Option<String>) {
        self.snapshot_tx.send_if_modified(|snapshot| {
            if snapshot.error == error {
                return false;
            }
            snapshot.error = error;
            true
        });
    }

    pub fn clear_error(&self) {
        self.set_error(None);
    }

    // ---- tasks ----

    pub async fn add_task(&self, title: &str, description: &str, status: &str) -> Result<Task, BoardError> {
        let draft = TaskDraft::new(title, description, status).inspect_err(|e| {
            log::warn!("[taskboard.board] Rejected task: {}", e);
        })?;
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.tasks.add(&owner, draft).await
        }
        .await;
        let task = self.settle(result, "Failed to add task")?;
        self.success("Task added successfully");
        Ok(task)
    }

    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<(), BoardError> {
        let patch = patch.normalized().inspect_err(|e| {
            log::warn!("[taskboard.board] Rejected update of {}: {}", id, e);
        })?;
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.tasks.update(&owner, id, patch).await
        }
        .await;
        self.settle(result, "Failed to update task")?;
        self.success("Task updated successfully");
        Ok(())
    }

    /// Moves are frequent (every drag-over); only failures are announced.
    pub async fn move_task(&self, id: &str, status: &str) -> Result<(), BoardError> {
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.tasks.move_to(&owner, id, status).await
        }
        .await;
        self.settle(result, "Failed to move task")
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), BoardError> {
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.tasks.delete(&owner, id).await
        }
        .await;
        self.settle(result, "Failed to delete task")?;
        self.success("Task deleted successfully");
        Ok(())
    }

    // ---- columns ----

    pub async fn add_column(&self, new: NewColumn) -> Result<Column, BoardError> {
        if new.name.trim().is_empty() {
            log::warn!("[taskboard.board] Rejected column with empty name");
            return Err(BoardError::InvalidColumnName);
        }
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.columns.add(&owner, new).await
        }
        .await;
        let column = self.settle(result, "Failed to add column")?;
        self.success("Column added successfully");
        Ok(column)
    }

    pub async fn rename_column(&self, status: &str, name: &str) -> Result<(), BoardError> {
        if name.trim().is_empty() {
            log::warn!("[taskboard.board] Rejected empty name for column '{}'", status);
            return Err(BoardError::InvalidColumnName);
        }
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.columns.rename(&owner, status, name).await
        }
        .await;
        self.settle(result, "Failed to rename column")?;
        self.success("Column renamed successfully");
        Ok(())
    }

    /// Removes the column together with every task in it.
    pub async fn delete_column(&self, status: &str) -> Result<ColumnRemoval, BoardError> {
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.columns.delete(&owner, status).await
        }
        .await;
        let removal = self.settle(result, "Failed to delete column")?;
        self.success("Column deleted successfully");
        Ok(removal)
    }

    /// Returns whether anything moved.
    pub async fn update_column_position(&self, status: &str, position: usize) -> Result<bool, BoardError> {
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.columns.update_position(&owner, status, position).await
        }
        .await;
        let changed = self.settle(result, "Failed to update column position")?;
        if changed {
            self.success("Column position updated");
        }
        Ok(changed)
    }

    /// Returns whether anything moved.
    pub async fn reorder_columns(&self, source_index: usize, destination_index: usize) -> Result<bool, BoardError> {
        self.clear_error();
        let result = async {
            let owner = self.require_owner()?;
            self.columns.reorder(&owner, source_index, destination_index).await
        }
        .await;
        self.settle(result, "Failed to reorder columns")
    }

    /// Carry out what a drag session resolved to.
    pub async fn dispatch(&self, intent: DragIntent) -> Result<(), BoardError> {
        log::debug!("[taskboard.board] Dispatching {:?}", intent);
        match intent {
            DragIntent::MoveTask { task_id, status } => self.move_task(&task_id, &status).await,
            DragIntent::ReorderColumns {
                source_index,
                destination_index,
            } => self
                .reorder_columns(source_index, destination_index)
                .await
                .map(|_| ()),
        }
    }

    // ---- helpers ----

    fn require_owner(&self) -> Result<String, BoardError> {
        self.owner().ok_or(BoardError::NotAuthenticated)
    }

    /// Failures are logged, kept as the board error and announced before
    /// being handed back to the caller.
    fn settle<T>(&self, result: Result<T, BoardError>, failure: &str) -> Result<T, BoardError> {
        if let Err(e) = &result {
            log::error!("[taskboard.board] {}: {}", failure, e);
            self.set_error(Some(e.to_string()));
            self.notifier.notify(Notification::error(failure));
        }
        result
    }

    fn success(&self, message: &str) {
        self.notifier.notify(Notification::success(message));
    }
}
