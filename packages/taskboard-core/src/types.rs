use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::BoardError;

/// Status code of a column. Tasks reference their column through it.
pub type Status = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    /// Assigned by the store when the task is created.
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    /// Stable identity across renames, unique per owner.
    pub status: Status,
    pub name: String,
    pub color: String,
    /// Zero-based display order, dense within one owner's columns.
    pub position: usize,
    pub owner_id: String,
}

/// A validated task that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: Status,
}

impl TaskDraft {
    /// Trim the inputs and reject an empty title.
    pub fn new(title: &str, description: &str, status: &str) -> Result<Self, BoardError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(BoardError::InvalidTitle);
        }
        Ok(Self {
            title: title.to_string(),
            description: description.trim().to_string(),
            status: status.to_string(),
        })
    }
}

/// Editable task fields. Status and owner are not part of it:
/// status changes go through a move, the owner never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TaskPatch {
    pub fn normalized(self) -> Result<Self, BoardError> {
        let title = match self.title {
            Some(title) => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(BoardError::InvalidTitle);
                }
                Some(title.to_string())
            }
            None => None,
        };
        Ok(Self {
            title,
            description: self.description.map(|d| d.trim().to_string()),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewColumn {
    pub name: String,
    pub color: String,
}

/// Display colors offered for new columns: (label, token).
pub const COLUMN_PALETTE: [(&str, &str); 8] = [
    ("Blue", "bg-blue-50/50"),
    ("Purple", "bg-purple-50/50"),
    ("Yellow", "bg-yellow-50/50"),
    ("Orange", "bg-orange-50/50"),
    ("Green", "bg-green-50/50"),
    ("Red", "bg-red-50/50"),
    ("Pink", "bg-pink-50/50"),
    ("Indigo", "bg-indigo-50/50"),
];

/// Derive a column status code from its display name: NFC-normalized,
/// lowercased, whitespace runs collapsed to a single hyphen.
///
/// "Code Review" and "code   review" both map to `code-review`.
pub fn derive_status_code(name: &str) -> Status {
    let normalized: String = name.trim().nfc().collect();
    normalized
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Keep only the documents of `owner_id`.
pub fn owned_tasks(tasks: impl IntoIterator<Item = Task>, owner_id: &str) -> Vec<Task> {
    tasks.into_iter().filter(|t| t.owner_id == owner_id).collect()
}

pub fn owned_columns(columns: impl IntoIterator<Item = Column>, owner_id: &str) -> Vec<Column> {
    columns
        .into_iter()
        .filter(|c| c.owner_id == owner_id)
        .collect()
}

/// Sort columns left to right. Ties (only possible after a lost race) fall
/// back to the document id so the order stays deterministic.
pub fn sort_columns(columns: &mut [Column]) {
    columns.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
}

/// Newest first, the order the task stream is delivered in.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
