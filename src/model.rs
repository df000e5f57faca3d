//! Data model for tumble.
//!
//! Tasks and subtasks are stored flat: a subtask points at its parent via
//! `task_id`, there is no nested containment. The persisted JSON layout uses
//! camelCase keys (`taskId`, `isFalling`, `createdAt`) so data written by
//! earlier versions of the app loads unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Sentinel for records persisted before the `order` field existed.
/// Service initialization backfills these from the array index.
pub const LEGACY_ORDER: i64 = -1;

fn legacy_order() -> i64 {
    LEGACY_ORDER
}

/// A top-level to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, assigned at creation, never reused while the task exists.
    pub id: i64,
    /// Trimmed, non-empty description.
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Display position among all tasks; dense 0..n-1 after every mutation.
    #[serde(default = "legacy_order")]
    pub order: i64,
    /// Whether the subtask panel is open. UI-only.
    #[serde(default)]
    pub expanded: bool,
    /// Transient: true only during the deletion animation window.
    #[serde(default)]
    pub is_falling: bool,
}

impl Task {
    pub fn new(id: i64, text: impl Into<String>, order: i64) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            order,
            expanded: false,
            is_falling: false,
        }
    }
}

/// A child item scoped to exactly one task.
///
/// Subtask ids are unique across the whole collection, not just within a
/// parent. `order` is dense 0..k-1 among siblings of the same `task_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: i64,
    /// Parent task. A subtask whose parent no longer exists is orphaned data.
    pub task_id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "legacy_order")]
    pub order: i64,
    #[serde(default)]
    pub is_falling: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Subtask {
    pub fn new(id: i64, task_id: i64, text: impl Into<String>, order: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            task_id,
            text: text.into(),
            completed: false,
            order,
            is_falling: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Completion filter for task list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    /// Project an order-sorted, filtered view of the collection.
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        let mut sorted: Vec<Task> = tasks.to_vec();
        sorted.sort_by_key(|task| task.order);
        match self {
            Filter::All => sorted,
            Filter::Active => sorted.into_iter().filter(|t| !t.completed).collect(),
            Filter::Completed => sorted.into_iter().filter(|t| t.completed).collect(),
        }
    }
}

impl FromStr for Filter {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            other => Err(Error::UnknownFilter(other.to_string())),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Active => write!(f, "active"),
            Filter::Completed => write!(f, "completed"),
        }
    }
}

/// Summary counts derived from the task collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub active: usize,
    pub completed: usize,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_wire_format_is_camel_case() {
        let task = Task::new(7, "Buy milk", 0);
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains("\"isFalling\":false"));
        assert!(json.contains("\"expanded\":false"));

        let subtask = Subtask::new(1, 7, "semi-skimmed", 0);
        let json = serde_json::to_string(&subtask).unwrap();
        assert!(json.contains("\"taskId\":7"));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"updatedAt\""));
    }

    #[test]
    fn legacy_records_deserialize_with_sentinel_order() {
        let raw = r#"{"id":3,"text":"old record","completed":true}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.order, LEGACY_ORDER);
        assert!(!task.expanded);
        assert!(!task.is_falling);
    }

    #[test]
    fn filter_sorts_by_order_and_selects_by_status() {
        let mut done = Task::new(1, "b", 1);
        done.completed = true;
        let tasks = vec![done.clone(), Task::new(2, "a", 0)];

        let all = Filter::All.apply(&tasks);
        assert_eq!(all[0].id, 2);
        assert_eq!(all[1].id, 1);

        assert_eq!(Filter::Active.apply(&tasks).len(), 1);
        assert_eq!(Filter::Completed.apply(&tasks)[0].id, 1);
    }

    #[test]
    fn filter_parses_known_names_only() {
        assert_eq!("active".parse::<Filter>().unwrap(), Filter::Active);
        assert_eq!(" All ".parse::<Filter>().unwrap(), Filter::All);
        assert!("done".parse::<Filter>().is_err());
    }
}
