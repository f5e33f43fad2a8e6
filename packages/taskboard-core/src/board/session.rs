//! Live subscriptions of one attached owner.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::snapshot::BoardSnapshot;
use crate::notify::{Notification, Notifier};
use crate::storage::{ChangeEvent, Collection, DocumentStore};
use crate::types::{owned_columns, owned_tasks};

/// Forwarding tasks of one attach. Dropping the session aborts them, so a
/// superseded owner can never keep a subscription alive.
pub(crate) struct BoardSession {
    pub(crate) owner_id: String,
    handles: Vec<JoinHandle<()>>,
}

impl BoardSession {
    pub(crate) fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            handles: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }
}

impl Drop for BoardSession {
    fn drop(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        log::debug!(
            "[taskboard.board.session] Cancelled {} subscriptions of {}",
            self.handles.len(),
            self.owner_id
        );
    }
}

/// Applies change events of one collection to the shared snapshot.
#[derive(Clone)]
pub(crate) struct Forwarder {
    pub(crate) owner_id: String,
    pub(crate) generation: u64,
    pub(crate) snapshot_tx: Arc<watch::Sender<BoardSnapshot>>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) store: Arc<dyn DocumentStore>,
}

impl Forwarder {
    /// Returns false when the event was dropped because the session it
    /// belongs to has been superseded.
    pub(crate) fn apply(&self, event: ChangeEvent) -> bool {
        match event {
            ChangeEvent::Tasks(tasks) => {
                let tasks = owned_tasks(tasks, &self.owner_id);
                self.update(|snapshot| {
                    snapshot.tasks = tasks;
                    snapshot.error = None;
                })
            }
            ChangeEvent::Columns(columns) => {
                let columns = owned_columns(columns, &self.owner_id);
                self.update(|snapshot| {
                    snapshot.columns = columns;
                    snapshot.loading = false;
                    snapshot.initialized = true;
                    snapshot.error = None;
                })
            }
            ChangeEvent::Failed {
                collection,
                message,
            } => {
                log::error!(
                    "[taskboard.board] {} subscription error: {}",
                    collection,
                    message
                );
                let current = self.update(|snapshot| {
                    snapshot.error = Some(message);
                    snapshot.loading = false;
                });
                if current {
                    let text = match collection {
                        Collection::Tasks => "Error loading tasks",
                        Collection::Columns => "Error loading columns",
                    };
                    self.notifier.notify(Notification::error(text));
                }
                current
            }
        }
    }

    fn update(&self, f: impl FnOnce(&mut BoardSnapshot)) -> bool {
        let generation = self.generation;
        self.snapshot_tx.send_if_modified(|snapshot| {
            if snapshot.generation != generation {
                return false;
            }
            f(snapshot);
            true
        })
    }

    pub(crate) fn spawn(
        self,
        collection: Collection,
        receiver: broadcast::Receiver<ChangeEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(collection, receiver))
    }

    async fn run(self, collection: Collection, mut receiver: broadcast::Receiver<ChangeEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if !self.apply(event) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "[taskboard.board] {} stream lagged by {} events, re-reading",
                        collection,
                        skipped
                    );
                    self.resync(collection).await;
                }
                Err(RecvError::Closed) => {
                    log::debug!("[taskboard.board] {} stream closed", collection);
                    break;
                }
            }
        }
    }

    async fn resync(&self, collection: Collection) {
        let event = match collection {
            Collection::Tasks => self.store.list_tasks().await.map(ChangeEvent::Tasks),
            Collection::Columns => self.store.list_columns().await.map(ChangeEvent::Columns),
        };
        let event = event.unwrap_or_else(|e| ChangeEvent::Failed {
            collection,
            message: e.to_string(),
        });
        self.apply(event);
    }
}
