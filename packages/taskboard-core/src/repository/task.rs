use std::sync::Arc;

use crate::error::BoardError;
use crate::storage::{DocumentStore, TaskUpdate};
use crate::types::{owned_tasks, Task, TaskDraft, TaskPatch};

/// Task collection access, scoped to one owner per call.
pub struct TaskRepository {
    store: Arc<dyn DocumentStore>,
}

impl TaskRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The owner's tasks, newest first.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Task>, BoardError> {
        Ok(owned_tasks(self.store.list_tasks().await?, owner_id))
    }

    pub async fn add(&self, owner_id: &str, draft: TaskDraft) -> Result<Task, BoardError> {
        let task = self.store.add_task(owner_id, draft).await?;
        log::info!(
            "[taskboard.tasks] Added task {} to '{}' for {}",
            task.id,
            task.status,
            owner_id
        );
        Ok(task)
    }

    /// Update title and/or description. Status and owner stay as they are.
    pub async fn update(&self, owner_id: &str, id: &str, patch: TaskPatch) -> Result<(), BoardError> {
        let patch = patch.normalized()?;
        self.ensure_owned(owner_id, id).await?;
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .update_task(
                id,
                TaskUpdate {
                    title: patch.title,
                    description: patch.description,
                    status: None,
                },
            )
            .await?;
        Ok(())
    }

    /// Status-only update. The target status is not checked against the
    /// live columns; a task pointing at no column is tolerated.
    pub async fn move_to(&self, owner_id: &str, id: &str, status: &str) -> Result<(), BoardError> {
        self.ensure_owned(owner_id, id).await?;
        self.store
            .update_task(
                id,
                TaskUpdate {
                    status: Some(status.to_string()),
                    ..TaskUpdate::default()
                },
            )
            .await?;
        log::debug!("[taskboard.tasks] Moved task {} to '{}'", id, status);
        Ok(())
    }

    pub async fn delete(&self, owner_id: &str, id: &str) -> Result<(), BoardError> {
        self.ensure_owned(owner_id, id).await?;
        self.store.delete_task(id).await?;
        log::info!("[taskboard.tasks] Deleted task {}", id);
        Ok(())
    }

    /// Another owner's task is reported as missing, never touched.
    async fn ensure_owned(&self, owner_id: &str, id: &str) -> Result<Task, BoardError> {
        match self.store.get_task(id).await? {
            Some(task) if task.owner_id == owner_id => Ok(task),
            _ => Err(BoardError::TaskNotFound(id.to_string())),
        }
    }
}
