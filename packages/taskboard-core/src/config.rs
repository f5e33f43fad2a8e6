//! Board configuration shared by the core and the backend.
use serde::{Deserialize, Serialize};

use crate::storage::memory::DEFAULT_CHANNEL_CAPACITY;

/// A column created for every new owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTemplate {
    pub status: String,
    pub name: String,
    pub color: String,
}

impl ColumnTemplate {
    fn new(status: &str, name: &str, color: &str) -> Self {
        Self {
            status: status.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    /// Seeded in this order (position = index) when an owner has no columns.
    #[serde(default = "default_columns")]
    pub default_columns: Vec<ColumnTemplate>,
    /// Pointer travel before a press turns into a drag.
    #[serde(default = "default_drag_activation_distance")]
    pub drag_activation_distance: f64,
    /// Buffered change events per live query before a subscriber lags.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

pub fn default_columns() -> Vec<ColumnTemplate> {
    vec![
        ColumnTemplate::new("todo", "To Do", "bg-blue-50/50"),
        ColumnTemplate::new("doing", "Doing", "bg-purple-50/50"),
        ColumnTemplate::new("progress", "In Progress", "bg-yellow-50/50"),
        ColumnTemplate::new("feedback", "Feedback", "bg-orange-50/50"),
        ColumnTemplate::new("done", "Done", "bg-green-50/50"),
    ]
}

fn default_drag_activation_distance() -> f64 {
    3.0
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_columns: default_columns(),
            drag_activation_distance: default_drag_activation_distance(),
            channel_capacity: default_channel_capacity(),
        }
    }
}
