use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use crate::config::ColumnTemplate;
use crate::error::BoardError;
use crate::sequencer::{self, PositionUpdate};
use crate::storage::{ColumnUpdate, DocumentStore, WriteBatch};
use crate::types::{derive_status_code, owned_columns, owned_tasks, sort_columns, Column, NewColumn};

/// Column collection access, scoped to one owner per call.
///
/// Structural operations (add, delete, position update, reorder, seeding)
/// of one owner run one at a time and always start from a fresh read of
/// the store, so two reorders cannot interleave and leave gaps.
pub struct ColumnRepository {
    store: Arc<dyn DocumentStore>,
    defaults: Vec<ColumnTemplate>,
    /// Per-owner structural lock
    owner_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Outcome of deleting a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRemoval {
    pub column: Column,
    pub removed_tasks: usize,
    pub renumbered: usize,
}

impl ColumnRepository {
    pub fn new(store: Arc<dyn DocumentStore>, defaults: Vec<ColumnTemplate>) -> Self {
        Self {
            store,
            defaults,
            owner_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_owner(&self, owner_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.owner_locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(owner_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// The owner's columns, left to right.
    pub async fn list(&self, owner_id: &str) -> Result<Vec<Column>, BoardError> {
        let mut columns = owned_columns(self.store.list_columns().await?, owner_id);
        sort_columns(&mut columns);
        Ok(columns)
    }

    /// Write the default columns in one batch if the owner has none yet.
    /// Returns whether anything was seeded.
    pub async fn seed_defaults(&self, owner_id: &str) -> Result<bool, BoardError> {
        let _guard = self.lock_owner(owner_id).await;
        if !self.list(owner_id).await?.is_empty() || self.defaults.is_empty() {
            return Ok(false);
        }

        let mut batch = WriteBatch::new();
        for (position, template) in self.defaults.iter().enumerate() {
            batch.set_column(Column {
                id: self.store.new_document_id(),
                status: template.status.clone(),
                name: template.name.clone(),
                color: template.color.clone(),
                position,
                owner_id: owner_id.to_string(),
            });
        }
        self.store.commit(batch).await?;
        log::info!(
            "[taskboard.columns] Seeded {} default columns for {}",
            self.defaults.len(),
            owner_id
        );
        Ok(true)
    }

    /// Append a column. Its status code is derived from the name; a code
    /// already used by another of the owner's columns is refused.
    pub async fn add(&self, owner_id: &str, new: NewColumn) -> Result<Column, BoardError> {
        let name = new.name.trim();
        let status = derive_status_code(name);
        if status.is_empty() {
            return Err(BoardError::InvalidColumnName);
        }

        let _guard = self.lock_owner(owner_id).await;
        let columns = self.list(owner_id).await?;
        if columns.iter().any(|c| c.status == status) {
            return Err(BoardError::StatusCollision { status });
        }

        let column = Column {
            id: self.store.new_document_id(),
            status,
            name: name.to_string(),
            color: new.color,
            position: sequencer::append_position(&columns),
            owner_id: owner_id.to_string(),
        };
        self.store.set_column(column.clone()).await?;
        log::info!(
            "[taskboard.columns] Added column '{}' at position {} for {}",
            column.status,
            column.position,
            owner_id
        );
        Ok(column)
    }

    /// Change the display name. The status code stays, tasks keep pointing
    /// at the column.
    pub async fn rename(&self, owner_id: &str, status: &str, new_name: &str) -> Result<(), BoardError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(BoardError::InvalidColumnName);
        }
        let column = self.find(owner_id, status).await?;
        self.store
            .update_column(
                &column.id,
                ColumnUpdate {
                    name: Some(new_name.to_string()),
                    ..ColumnUpdate::default()
                },
            )
            .await?;
        Ok(())
    }

    /// Delete a column with every task of its status and close the gap,
    /// all in one batch.
    pub async fn delete(&self, owner_id: &str, status: &str) -> Result<ColumnRemoval, BoardError> {
        let _guard = self.lock_owner(owner_id).await;
        let columns = self.list(owner_id).await?;
        let column = columns
            .iter()
            .find(|c| c.status == status)
            .cloned()
            .ok_or_else(|| BoardError::ColumnNotFound(status.to_string()))?;
        let doomed: Vec<String> = owned_tasks(self.store.list_tasks().await?, owner_id)
            .into_iter()
            .filter(|t| t.status == status)
            .map(|t| t.id)
            .collect();
        let updates = sequencer::close_gap(&columns, status);

        let mut batch = WriteBatch::new();
        for id in &doomed {
            batch.delete_task(id);
        }
        batch.delete_column(&column.id);
        push_positions(&mut batch, &updates);
        self.store.commit(batch).await?;

        log::info!(
            "[taskboard.columns] Deleted column '{}' with {} tasks for {}",
            status,
            doomed.len(),
            owner_id
        );
        Ok(ColumnRemoval {
            column,
            removed_tasks: doomed.len(),
            renumbered: updates.len(),
        })
    }

    /// Move a column to `position`. Returns false (and writes nothing) when
    /// it is already there.
    pub async fn update_position(
        &self,
        owner_id: &str,
        status: &str,
        position: usize,
    ) -> Result<bool, BoardError> {
        let _guard = self.lock_owner(owner_id).await;
        let columns = self.list(owner_id).await?;
        if !columns.iter().any(|c| c.status == status) {
            return Err(BoardError::ColumnNotFound(status.to_string()));
        }
        let updates = sequencer::move_to(&columns, status, position)?;
        self.commit_positions(&updates).await
    }

    /// Splice-reorder by index in the position-sorted list.
    pub async fn reorder(
        &self,
        owner_id: &str,
        source_index: usize,
        destination_index: usize,
    ) -> Result<bool, BoardError> {
        let _guard = self.lock_owner(owner_id).await;
        let columns = self.list(owner_id).await?;
        let updates = sequencer::splice(&columns, source_index, destination_index)?;
        self.commit_positions(&updates).await
    }

    async fn find(&self, owner_id: &str, status: &str) -> Result<Column, BoardError> {
        self.list(owner_id)
            .await?
            .into_iter()
            .find(|c| c.status == status)
            .ok_or_else(|| BoardError::ColumnNotFound(status.to_string()))
    }

    async fn commit_positions(&self, updates: &[PositionUpdate]) -> Result<bool, BoardError> {
        if updates.is_empty() {
            return Ok(false);
        }
        let mut batch = WriteBatch::new();
        push_positions(&mut batch, updates);
        self.store.commit(batch).await?;
        Ok(true)
    }
}

fn push_positions(batch: &mut WriteBatch, updates: &[PositionUpdate]) {
    for update in updates {
        batch.update_column(&update.column_id, ColumnUpdate::position(update.position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_columns;
    use crate::sequencer::{is_dense, SequenceError};
    use crate::storage::memory::MemoryStore;
    use crate::types::TaskDraft;

    async fn seeded(owner: &str) -> (Arc<MemoryStore>, ColumnRepository) {
        let store = Arc::new(MemoryStore::new(64));
        let repo = ColumnRepository::new(store.clone(), default_columns());
        assert!(repo.seed_defaults(owner).await.unwrap());
        (store, repo)
    }

    fn statuses(columns: &[Column]) -> Vec<String> {
        columns.iter().map(|c| c.status.clone()).collect()
    }

    #[tokio::test]
    async fn test_seed_only_once_per_owner() {
        let (store, repo) = seeded("u1").await;
        assert!(!repo.seed_defaults("u1").await.unwrap());
        // A second owner gets their own defaults
        assert!(repo.seed_defaults("u2").await.unwrap());
        assert_eq!(store.list_columns().await.unwrap().len(), 10);
        assert_eq!(
            statuses(&repo.list("u2").await.unwrap()),
            vec!["todo", "doing", "progress", "feedback", "done"]
        );
    }

    #[tokio::test]
    async fn test_add_derives_status_and_appends() {
        let (_, repo) = seeded("u1").await;
        let column = repo
            .add(
                "u1",
                NewColumn {
                    name: "Code Review".into(),
                    color: "x".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(column.status, "code-review");
        assert_eq!(column.position, 5);
    }

    #[tokio::test]
    async fn test_add_rejects_status_collision() {
        let (store, repo) = seeded("u1").await;
        repo.add("u1", NewColumn { name: "To Do".into(), color: "x".into() })
            .await
            .unwrap();
        let writes = store.write_count();
        let result = repo
            .add("u1", NewColumn { name: "to  do".into(), color: "y".into() })
            .await;
        assert!(matches!(result, Err(BoardError::StatusCollision { ref status }) if status == "to-do"));
        assert_eq!(store.write_count(), writes);

        assert!(matches!(
            repo.add("u1", NewColumn { name: "   ".into(), color: "y".into() }).await,
            Err(BoardError::InvalidColumnName)
        ));
    }

    #[tokio::test]
    async fn test_rename_keeps_status() {
        let (_, repo) = seeded("u1").await;
        repo.rename("u1", "doing", "  Working  ").await.unwrap();
        let column = repo.find("u1", "doing").await.unwrap();
        assert_eq!(column.name, "Working");
        assert!(matches!(
            repo.rename("u1", "ghost", "x").await,
            Err(BoardError::ColumnNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_and_renumbers() {
        let (store, repo) = seeded("u1").await;
        for title in ["a", "b", "c"] {
            store
                .add_task("u1", TaskDraft::new(title, "", "doing").unwrap())
                .await
                .unwrap();
        }
        let keep = store
            .add_task("u1", TaskDraft::new("keep", "", "todo").unwrap())
            .await
            .unwrap();
        // Same status, other owner: must survive
        let foreign = store
            .add_task("u2", TaskDraft::new("foreign", "", "doing").unwrap())
            .await
            .unwrap();

        let removal = repo.delete("u1", "doing").await.unwrap();
        assert_eq!(removal.removed_tasks, 3);

        let columns = repo.list("u1").await.unwrap();
        assert_eq!(statuses(&columns), vec!["todo", "progress", "feedback", "done"]);
        assert!(is_dense(&columns));

        let remaining: Vec<String> = store.list_tasks().await.unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.contains(&keep.id));
        assert!(remaining.contains(&foreign.id));
    }

    #[tokio::test]
    async fn test_update_position_moves_column() {
        let store = Arc::new(MemoryStore::new(64));
        let repo = ColumnRepository::new(store.clone(), Vec::new());
        for name in ["A", "B", "C"] {
            repo.add("u1", NewColumn { name: name.into(), color: "x".into() })
                .await
                .unwrap();
        }
        assert!(repo.update_position("u1", "c", 0).await.unwrap());
        let columns = repo.list("u1").await.unwrap();
        let order: Vec<(String, usize)> = columns.iter().map(|c| (c.status.clone(), c.position)).collect();
        assert_eq!(
            order,
            vec![("c".to_string(), 0), ("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_update_position_noop_writes_nothing() {
        let (store, repo) = seeded("u1").await;
        let writes = store.write_count();
        assert!(!repo.update_position("u1", "progress", 2).await.unwrap());
        assert_eq!(store.write_count(), writes);
        assert!(matches!(
            repo.update_position("u1", "progress", 9).await,
            Err(BoardError::Sequence(SequenceError::PositionOutOfRange { .. }))
        ));
    }

    #[tokio::test]
    async fn test_reorder_and_back() {
        let (_, repo) = seeded("u1").await;
        let before = repo.list("u1").await.unwrap();
        repo.reorder("u1", 4, 1).await.unwrap();
        assert_eq!(
            statuses(&repo.list("u1").await.unwrap()),
            vec!["todo", "done", "doing", "progress", "feedback"]
        );
        repo.reorder("u1", 1, 4).await.unwrap();
        assert_eq!(repo.list("u1").await.unwrap(), before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reorders_stay_dense() {
        let (_, repo) = seeded("u1").await;
        let repo = Arc::new(repo);
        let mut handles = Vec::new();
        for i in 0..16usize {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.reorder("u1", i % 5, (i * 3) % 5).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert!(is_dense(&repo.list("u1").await.unwrap()));
    }
}
