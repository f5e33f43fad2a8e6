//! Repositories: the only code that writes to the document store.

mod column;
mod task;

pub use column::{ColumnRemoval, ColumnRepository};
pub use task::TaskRepository;
