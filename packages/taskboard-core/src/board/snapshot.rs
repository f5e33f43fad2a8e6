use serde::Serialize;

use crate::types::{Column, Task};

/// What the UI renders: the confirmed state of the current owner's board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub owner_id: Option<String>,
    /// Newest first.
    pub tasks: Vec<Task>,
    /// Left to right.
    pub columns: Vec<Column>,
    pub is_online: bool,
    /// Last failure message, kept until cleared or superseded.
    pub error: Option<String>,
    /// A first column snapshot has arrived for this owner.
    pub initialized: bool,
    pub loading: bool,
    /// Attach session this snapshot belongs to.
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            owner_id: None,
            tasks: Vec::new(),
            columns: Vec::new(),
            is_online: true,
            error: None,
            initialized: false,
            loading: false,
            generation: 0,
        }
    }
}

impl BoardSnapshot {
    pub fn column(&self, status: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.status == status)
    }

    pub fn tasks_in<'a>(&'a self, status: &'a str) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks.iter().filter(move |t| t.status == status)
    }

    /// Tasks whose status matches no column; rendered under no column.
    pub fn orphaned_tasks(&self) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| self.column(&t.status).is_none())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_orphaned_tasks() {
        let snapshot = BoardSnapshot {
            columns: vec![Column {
                id: "c1".into(),
                status: "todo".into(),
                name: "To Do".into(),
                color: String::new(),
                position: 0,
                owner_id: "u1".into(),
            }],
            tasks: ["todo", "gone"]
                .iter()
                .enumerate()
                .map(|(i, s)| Task {
                    id: format!("t{}", i),
                    title: "x".into(),
                    description: String::new(),
                    status: s.to_string(),
                    created_at: Utc::now(),
                    owner_id: "u1".into(),
                })
                .collect(),
            ..BoardSnapshot::default()
        };
        assert_eq!(snapshot.tasks_in("todo").count(), 1);
        let orphans = snapshot.orphaned_tasks();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].status, "gone");
    }

    #[test]
    fn test_snapshot_json_hides_generation() {
        let json = serde_json::to_value(BoardSnapshot::default()).unwrap();
        assert_eq!(json["isOnline"], true);
        assert!(json.get("generation").is_none());
    }
}
