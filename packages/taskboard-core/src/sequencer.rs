//! Position sequencer for an owner's columns.
//!
//! Every function takes the columns in any order, works on the
//! position-sorted view and returns the position writes that leave the set
//! dense (`0..count`). Callers commit the returned updates as one batch.

use crate::types::{sort_columns, Column};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpdate {
    pub column_id: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("Column not found: {0}")]
    UnknownStatus(String),

    #[error("Position {position} out of range (0-{max})")]
    PositionOutOfRange { position: usize, max: usize },

    #[error("Index {index} out of range (0-{max})")]
    IndexOutOfRange { index: usize, max: usize },
}

fn sorted(columns: &[Column]) -> Vec<Column> {
    let mut sorted = columns.to_vec();
    sort_columns(&mut sorted);
    sorted
}

/// Position of a column appended to the end.
pub fn append_position(columns: &[Column]) -> usize {
    columns.len()
}

/// Writes needed after removing the column with `removed_status`.
/// Only columns whose position actually changes are returned.
pub fn close_gap(columns: &[Column], removed_status: &str) -> Vec<PositionUpdate> {
    sorted(columns)
        .into_iter()
        .filter(|c| c.status != removed_status)
        .enumerate()
        .filter(|(index, c)| c.position != *index)
        .map(|(index, c)| PositionUpdate {
            column_id: c.id,
            position: index,
        })
        .collect()
}

/// Move one column to `target`. Columns between the old and the new slot
/// shift by one towards the gap. Returns no updates when the column is
/// already there.
pub fn move_to(
    columns: &[Column],
    status: &str,
    target: usize,
) -> Result<Vec<PositionUpdate>, SequenceError> {
    let mut order = sorted(columns);
    let from = order
        .iter()
        .position(|c| c.status == status)
        .ok_or_else(|| SequenceError::UnknownStatus(status.to_string()))?;

    if target >= order.len() {
        return Err(SequenceError::PositionOutOfRange {
            position: target,
            max: order.len().saturating_sub(1),
        });
    }
    if from == target && order[from].position == target {
        return Ok(Vec::new());
    }

    let moved = order.remove(from);
    order.insert(target, moved);

    Ok(order
        .into_iter()
        .enumerate()
        .filter(|(index, c)| c.position != *index)
        .map(|(index, c)| PositionUpdate {
            column_id: c.id,
            position: index,
        })
        .collect())
}

/// Array-splice reorder: take the column at `source`, reinsert it at
/// `destination`, renumber every column.
pub fn splice(
    columns: &[Column],
    source: usize,
    destination: usize,
) -> Result<Vec<PositionUpdate>, SequenceError> {
    let mut order = sorted(columns);
    let max = order.len().saturating_sub(1);
    for index in [source, destination] {
        if index >= order.len() {
            return Err(SequenceError::IndexOutOfRange { index, max });
        }
    }
    if source == destination {
        return Ok(Vec::new());
    }

    let moved = order.remove(source);
    order.insert(destination, moved);

    Ok(order
        .into_iter()
        .enumerate()
        .map(|(index, c)| PositionUpdate {
            column_id: c.id,
            position: index,
        })
        .collect())
}

/// Apply updates in place (what the store does when the batch commits).
pub fn apply(columns: &mut [Column], updates: &[PositionUpdate]) {
    for update in updates {
        if let Some(column) = columns.iter_mut().find(|c| c.id == update.column_id) {
            column.position = update.position;
        }
    }
}

/// True when positions are exactly `0..len` without duplicates.
pub fn is_dense(columns: &[Column]) -> bool {
    let mut positions: Vec<usize> = columns.iter().map(|c| c.position).collect();
    positions.sort_unstable();
    positions.iter().enumerate().all(|(i, p)| i == *p)
}
