use crate::sequencer::SequenceError;
use crate::storage::StoreError;

/// Errors surfaced by the repositories and the board state.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Task title must not be empty")]
    InvalidTitle,

    #[error("Column name must not be empty")]
    InvalidColumnName,

    #[error("A column with status '{status}' already exists")]
    StatusCollision { status: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
