//! Drag-interaction controller.
//!
//! Turns pointer drag sessions over the board into intents for the board
//! state. Tasks move between columns while they are dragged over them;
//! columns are reordered when dropped. Task order inside a column is never
//! persisted.

use serde::{Deserialize, Serialize};

use crate::types::{sort_columns, Column};

/// Something being dragged, or something under the pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DragItem {
    Task { id: String, status: String },
    Column { status: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragIntent {
    MoveTask {
        task_id: String,
        status: String,
    },
    ReorderColumns {
        source_index: usize,
        destination_index: usize,
    },
}

/// Decide what dropping `active` onto `over` means.
///
/// A task dropped on a task takes that task's column, dropped on a column it
/// takes the column itself. A column dropped on a column (or on a task
/// inside it) reorders by position-sorted index. Dropping onto itself, or
/// onto the column a task already sits in, means nothing.
pub fn resolve_drop(active: &DragItem, over: &DragItem, columns: &[Column]) -> Option<DragIntent> {
    if active == over {
        return None;
    }
    let target_status = match over {
        DragItem::Task { status, .. } | DragItem::Column { status } => status,
    };

    match active {
        DragItem::Task { id, status } => {
            if let DragItem::Task { id: over_id, .. } = over {
                if over_id == id {
                    return None;
                }
            }
            if target_status == status {
                return None;
            }
            Some(DragIntent::MoveTask {
                task_id: id.clone(),
                status: target_status.clone(),
            })
        }
        DragItem::Column { status } => {
            let mut sorted = columns.to_vec();
            sort_columns(&mut sorted);
            let source_index = sorted.iter().position(|c| &c.status == status)?;
            let destination_index = sorted.iter().position(|c| &c.status == target_status)?;
            if source_index == destination_index {
                return None;
            }
            Some(DragIntent::ReorderColumns {
                source_index,
                destination_index,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Pressed { item: DragItem, origin: (f64, f64) },
    Dragging { item: DragItem },
}

/// One pointer drag session at a time.
#[derive(Debug, Clone)]
pub struct DragController {
    activation_distance: f64,
    state: DragState,
}

impl DragController {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            activation_distance: activation_distance.max(0.0),
            state: DragState::Idle,
        }
    }

    /// Pointer pressed on an item. Nothing is dragged until the pointer
    /// travels the activation distance.
    pub fn press(&mut self, item: DragItem, x: f64, y: f64) {
        self.state = DragState::Pressed {
            item,
            origin: (x, y),
        };
    }

    /// Returns true while a drag is active.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        if let DragState::Pressed { item, origin } = &self.state {
            let distance = ((x - origin.0).powi(2) + (y - origin.1).powi(2)).sqrt();
            if distance >= self.activation_distance {
                log::trace!("[taskboard.drag] Drag started: {:?}", item);
                self.state = DragState::Dragging { item: item.clone() };
            }
        }
        self.is_dragging()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// The item shown in the drag overlay.
    pub fn active(&self) -> Option<&DragItem> {
        match &self.state {
            DragState::Dragging { item } => Some(item),
            _ => None,
        }
    }

    /// Pointer is over `over` mid-drag. Dragged tasks move right away, so
    /// the board follows the pointer. The session keeps the task's old
    /// status until the caller reports the move through `confirm`, so a
    /// failed move is offered again on the next hover.
    pub fn drag_over(&self, over: &DragItem, columns: &[Column]) -> Option<DragIntent> {
        let DragState::Dragging { item } = &self.state else {
            return None;
        };
        if !matches!(item, DragItem::Task { .. }) {
            return None;
        }
        resolve_drop(item, over, columns)
    }

    /// The store accepted `intent`; the dragged task now sits in its
    /// target column.
    pub fn confirm(&mut self, intent: &DragIntent) {
        let DragState::Dragging {
            item: DragItem::Task { id, status },
        } = &mut self.state
        else {
            return;
        };
        if let DragIntent::MoveTask {
            task_id,
            status: target,
        } = intent
        {
            if task_id == &*id {
                *status = target.clone();
            }
        }
    }

    /// Pointer released. Ends the session whatever the outcome; a release
    /// before the drag activated is a click and yields nothing.
    pub fn drop(&mut self, over: Option<&DragItem>, columns: &[Column]) -> Option<DragIntent> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let (DragState::Dragging { item }, Some(over)) = (state, over) else {
            return None;
        };
        resolve_drop(&item, over, columns)
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        ["todo", "doing", "done"]
            .iter()
            .enumerate()
            .map(|(i, s)| Column {
                id: format!("id-{}", s),
                status: s.to_string(),
                name: s.to_string(),
                color: String::new(),
                position: i,
                owner_id: "u1".into(),
            })
            .collect()
    }

    fn task(id: &str, status: &str) -> DragItem {
        DragItem::Task {
            id: id.into(),
            status: status.into(),
        }
    }

    fn column(status: &str) -> DragItem {
        DragItem::Column {
            status: status.into(),
        }
    }

    #[test]
    fn test_task_over_task_takes_its_column() {
        let intent = resolve_drop(&task("t1", "todo"), &task("t2", "done"), &columns());
        assert_eq!(
            intent,
            Some(DragIntent::MoveTask {
                task_id: "t1".into(),
                status: "done".into()
            })
        );
    }

    #[test]
    fn test_task_over_column_area() {
        let intent = resolve_drop(&task("t1", "todo"), &column("doing"), &columns());
        assert_eq!(
            intent,
            Some(DragIntent::MoveTask {
                task_id: "t1".into(),
                status: "doing".into()
            })
        );
        assert_eq!(resolve_drop(&task("t1", "todo"), &column("todo"), &columns()), None);
        assert_eq!(resolve_drop(&task("t1", "todo"), &task("t1", "todo"), &columns()), None);
    }

    #[test]
    fn test_column_drop_reorders() {
        let intent = resolve_drop(&column("done"), &column("todo"), &columns());
        assert_eq!(
            intent,
            Some(DragIntent::ReorderColumns {
                source_index: 2,
                destination_index: 0
            })
        );
        assert_eq!(resolve_drop(&column("ghost"), &column("todo"), &columns()), None);
    }

    #[test]
    fn test_activation_distance() {
        let mut drag = DragController::new(3.0);
        drag.press(task("t1", "todo"), 10.0, 10.0);
        assert!(!drag.pointer_move(11.0, 11.0));
        assert!(drag.active().is_none());
        // Released before activation: a click, not a drop
        assert_eq!(drag.drop(Some(&column("done")), &columns()), None);

        drag.press(task("t1", "todo"), 10.0, 10.0);
        assert!(drag.pointer_move(13.0, 10.0));
        assert_eq!(drag.active(), Some(&task("t1", "todo")));
    }

    #[test]
    fn test_drag_over_moves_once_per_column() {
        let cols = columns();
        let mut drag = DragController::new(3.0);
        drag.press(task("t1", "todo"), 0.0, 0.0);
        drag.pointer_move(10.0, 0.0);

        let intent = drag.drag_over(&column("doing"), &cols).unwrap();
        drag.confirm(&intent);
        assert!(drag.drag_over(&column("doing"), &cols).is_none());
        assert!(drag.drag_over(&task("t9", "doing"), &cols).is_none());
        // Dropping where it already went is a no-op
        assert_eq!(drag.drop(Some(&column("doing")), &cols), None);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn test_unconfirmed_move_is_offered_again() {
        let cols = columns();
        let mut drag = DragController::new(3.0);
        drag.press(task("t1", "todo"), 0.0, 0.0);
        drag.pointer_move(10.0, 0.0);

        let first = drag.drag_over(&column("doing"), &cols);
        assert!(first.is_some());
        // The move failed, so nothing was confirmed: hovering retries it
        assert_eq!(drag.drag_over(&column("doing"), &cols), first);
        assert_eq!(drag.active(), Some(&task("t1", "todo")));

        // A confirmation for another task changes nothing
        drag.confirm(&DragIntent::MoveTask {
            task_id: "t2".into(),
            status: "doing".into(),
        });
        assert_eq!(drag.drag_over(&column("doing"), &cols), first);
    }

    #[test]
    fn test_column_drag_over_is_ignored_until_drop() {
        let cols = columns();
        let mut drag = DragController::new(0.0);
        drag.press(column("todo"), 0.0, 0.0);
        drag.pointer_move(0.0, 0.0);
        assert!(drag.drag_over(&column("done"), &cols).is_none());
        assert_eq!(
            drag.drop(Some(&column("done")), &cols),
            Some(DragIntent::ReorderColumns {
                source_index: 0,
                destination_index: 2
            })
        );
    }

    #[test]
    fn test_cancel() {
        let mut drag = DragController::new(0.0);
        drag.press(task("t1", "todo"), 0.0, 0.0);
        drag.pointer_move(1.0, 1.0);
        drag.cancel();
        assert!(drag.drop(Some(&column("done")), &columns()).is_none());
    }

    #[test]
    fn test_drag_item_json() {
        let item: DragItem = serde_json::from_str(r#"{"type":"task","id":"t1","status":"todo"}"#).unwrap();
        assert_eq!(item, task("t1", "todo"));
    }
}
