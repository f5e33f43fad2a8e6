pub mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Column, Task, TaskDraft};

/// The two collections a board is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Tasks,
    Columns,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Tasks => f.write_str("tasks"),
            Collection::Columns => f.write_str("columns"),
        }
    }
}

/// Field update for a task document. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Field update for a column document. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub position: Option<usize>,
}

impl ColumnUpdate {
    pub fn position(position: usize) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    SetColumn(Column),
    UpdateColumn { id: String, update: ColumnUpdate },
    DeleteColumn { id: String },
    DeleteTask { id: String },
}

/// Multi-document write committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_column(&mut self, column: Column) -> &mut Self {
        self.ops.push(BatchOp::SetColumn(column));
        self
    }

    pub fn update_column(&mut self, id: &str, update: ColumnUpdate) -> &mut Self {
        self.ops.push(BatchOp::UpdateColumn {
            id: id.to_string(),
            update,
        });
        self
    }

    pub fn delete_column(&mut self, id: &str) -> &mut Self {
        self.ops.push(BatchOp::DeleteColumn { id: id.to_string() });
        self
    }

    pub fn delete_task(&mut self, id: &str) -> &mut Self {
        self.ops.push(BatchOp::DeleteTask { id: id.to_string() });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Pushed on a live query. Snapshots carry the whole collection, unfiltered:
/// tasks newest first, columns by position.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Tasks(Vec<Task>),
    Columns(Vec<Column>),
    Failed {
        collection: Collection,
        message: String,
    },
}

/// A live query: the snapshot at subscription time plus every later change.
pub struct Subscription {
    pub initial: ChangeEvent,
    pub receiver: broadcast::Receiver<ChangeEvent>,
}

/// Document store holding the `tasks` and `columns` collections.
///
/// Implementations: MemoryStore (in process, optional JSON persistence).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All tasks, newest first.
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// All columns, by position.
    async fn list_columns(&self) -> Result<Vec<Column>, StoreError>;

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError>;

    /// Create a task; the store assigns id and creation timestamp.
    async fn add_task(&self, owner_id: &str, draft: TaskDraft) -> Result<Task, StoreError>;

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<(), StoreError>;

    async fn delete_task(&self, id: &str) -> Result<(), StoreError>;

    /// Create or overwrite a column document under its own id.
    async fn set_column(&self, column: Column) -> Result<(), StoreError>;

    async fn update_column(&self, id: &str, update: ColumnUpdate) -> Result<(), StoreError>;

    /// Apply every op of the batch or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, StoreError>;

    /// Fresh document id for documents whose id is chosen before writing.
    fn new_document_id(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data file: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_batch_builder() {
        let mut batch = WriteBatch::new();
        assert!(batch.is_empty());
        batch
            .delete_task("t1")
            .delete_column("c1")
            .update_column("c2", ColumnUpdate::position(0));
        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.ops()[2],
            BatchOp::UpdateColumn {
                id: "c2".into(),
                update: ColumnUpdate {
                    position: Some(0),
                    ..ColumnUpdate::default()
                },
            }
        );
    }

    #[test]
    fn test_collection_display() {
        assert_eq!(Collection::Tasks.to_string(), "tasks");
        assert_eq!(
            StoreError::NotFound {
                collection: Collection::Columns,
                id: "abc".into()
            }
            .to_string(),
            "Document not found: columns/abc"
        );
    }
}
