//! Task operations for tumble.
//!
//! CRUD and queries over the top-level task collection. Deletion is
//! two-phase to drive the fall animation: `begin_delete` marks the task as
//! falling and persists immediately, `finish_delete` physically removes it
//! and renumbers the survivors. [`TaskService::delete_task`] runs both
//! phases with the fall window in between on the tokio clock; callers that
//! do not animate (tests, the CLI) call the phases directly.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::model::{Filter, Task, TaskCounts, LEGACY_ORDER};
use crate::state::StateHolder;

/// Fall animation window before physical removal, in milliseconds.
/// Matches the CSS transition duration in the UI.
pub const FALL_WINDOW_MS: u64 = 500;

/// CRUD and query operations over tasks
#[derive(Debug)]
pub struct TaskService {
    state: Arc<StateHolder>,
    fall_window: Duration,
    next_id: AtomicI64,
}

impl TaskService {
    /// Create the service, normalizing and republishing persisted tasks
    ///
    /// Records persisted before the `order` field existed are backfilled
    /// with their array index; `expanded` defaults to collapsed. The
    /// normalized set is written back so the migration runs once.
    pub fn new(state: Arc<StateHolder>) -> Result<Self> {
        Self::with_fall_window(state, Duration::from_millis(FALL_WINDOW_MS))
    }

    /// Create the service with an explicit fall window
    pub fn with_fall_window(state: Arc<StateHolder>, fall_window: Duration) -> Result<Self> {
        let mut tasks = state.load_tasks();
        for (index, task) in tasks.iter_mut().enumerate() {
            if task.order == LEGACY_ORDER {
                task.order = index as i64;
            }
        }
        state.save_tasks(tasks)?;

        let service = Self {
            state,
            fall_window,
            next_id: AtomicI64::new(0),
        };
        service.recompute_next_id();
        Ok(service)
    }

    /// Subscribe to task collection changes; replays the latest value
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.state.subscribe_tasks()
    }

    /// Synchronous snapshot of the current task collection
    pub fn current_tasks(&self) -> Vec<Task> {
        self.state.current_tasks()
    }

    // =========================================================================
    // CRUD operations
    // =========================================================================

    /// Create a task at the end of the list
    ///
    /// Whitespace-only text is silently rejected with no mutation.
    pub fn add_task(&self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("ignoring empty task text");
            return Ok(());
        }

        let mut tasks = self.current_tasks();
        let order = tasks.iter().map(|t| t.order).max().map_or(0, |max| max + 1);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(id, order, "adding task");
        tasks.push(Task::new(id, text, order));
        self.state.save_tasks(tasks)
    }

    /// Flip the completion flag; unknown ids persist the collection unchanged
    pub fn toggle_completion(&self, task_id: i64) -> Result<()> {
        let tasks = self
            .current_tasks()
            .into_iter()
            .map(|mut task| {
                if task.id == task_id {
                    task.completed = !task.completed;
                }
                task
            })
            .collect();
        self.state.save_tasks(tasks)
    }

    /// Flip the subtask panel open/closed
    pub fn toggle_expansion(&self, task_id: i64) -> Result<()> {
        let tasks = self
            .current_tasks()
            .into_iter()
            .map(|mut task| {
                if task.id == task_id {
                    task.expanded = !task.expanded;
                }
                task
            })
            .collect();
        self.state.save_tasks(tasks)
    }

    /// Phase one of deletion: mark the task as falling and persist
    ///
    /// An unknown id persists the collection unchanged; phase two is still
    /// safe to run and removes nothing.
    pub fn begin_delete(&self, task_id: i64) -> Result<()> {
        let tasks = self
            .current_tasks()
            .into_iter()
            .map(|mut task| {
                if task.id == task_id {
                    task.is_falling = true;
                }
                task
            })
            .collect();
        self.state.save_tasks(tasks)
    }

    /// Phase two of deletion: physically remove and renumber survivors
    ///
    /// Survivors are renumbered to a dense 0..n-1 by their position after
    /// filtering. Subscribers get a redundant re-notification afterwards so
    /// every view settles on the final collection.
    pub fn finish_delete(&self, task_id: i64) -> Result<()> {
        let tasks: Vec<Task> = self
            .current_tasks()
            .into_iter()
            .filter(|task| task.id != task_id)
            .enumerate()
            .map(|(index, mut task)| {
                task.order = index as i64;
                task
            })
            .collect();

        tracing::debug!(task_id, remaining = tasks.len(), "removing task");
        self.state.save_tasks(tasks)?;
        self.recompute_next_id();
        self.state.update_tasks(self.current_tasks());
        Ok(())
    }

    /// Two-phase delete with the fall window between the phases
    pub async fn delete_task(&self, task_id: i64) -> Result<()> {
        self.begin_delete(task_id)?;
        tokio::time::sleep(self.fall_window).await;
        self.finish_delete(task_id)
    }

    /// Move a task within the order-sorted view
    ///
    /// `from` and `to` are positions in the sorted view, not raw indices.
    /// Out-of-range positions are rejected.
    pub fn reorder(&self, from: usize, to: usize) -> Result<()> {
        let mut sorted = self.current_tasks();
        sorted.sort_by_key(|t| t.order);

        let len = sorted.len();
        if from >= len {
            return Err(Error::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(Error::IndexOutOfRange { index: to, len });
        }

        let moved = sorted.remove(from);
        sorted.insert(to, moved);
        for (index, task) in sorted.iter_mut().enumerate() {
            task.order = index as i64;
        }
        self.state.save_tasks(sorted)
    }

    /// Remove every completed task, renumber and collapse the survivors
    pub fn clear_completed(&self) -> Result<()> {
        let tasks: Vec<Task> = self
            .current_tasks()
            .into_iter()
            .filter(|task| !task.completed)
            .enumerate()
            .map(|(index, mut task)| {
                task.order = index as i64;
                task.expanded = false;
                task
            })
            .collect();

        self.state.save_tasks(tasks)?;
        self.recompute_next_id();
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Order-sorted view of the collection under the given filter
    pub fn filtered_tasks(&self, filter: Filter) -> Vec<Task> {
        filter.apply(&self.current_tasks())
    }

    /// Active, completed, and total counts
    pub fn counts(&self) -> TaskCounts {
        let tasks = self.current_tasks();
        let completed = tasks.iter().filter(|t| t.completed).count();
        TaskCounts {
            active: tasks.len() - completed,
            completed,
            total: tasks.len(),
        }
    }

    pub fn task_by_id(&self, task_id: i64) -> Option<Task> {
        self.current_tasks().into_iter().find(|t| t.id == task_id)
    }

    pub fn task_exists(&self, task_id: i64) -> bool {
        self.current_tasks().iter().any(|t| t.id == task_id)
    }

    pub fn task_has_subtasks(&self, task_id: i64) -> bool {
        self.state.task_has_subtasks(task_id)
    }

    /// Subtask count passthrough, for caller convenience
    pub fn subtask_count(&self, task_id: i64) -> usize {
        self.state.subtask_count(task_id)
    }

    pub fn completed_subtask_count(&self, task_id: i64) -> usize {
        self.state.completed_subtask_count(task_id)
    }

    pub fn completion_percentage(&self, task_id: i64) -> u32 {
        self.state.completion_percentage(task_id)
    }

    /// Seed the id counter one past the maximum existing id, or from the
    /// clock when the collection is empty (so ids stay unique across
    /// fully-cleared lists).
    fn recompute_next_id(&self) {
        let next = self
            .current_tasks()
            .iter()
            .map(|t| t.id)
            .max()
            .map_or_else(|| Utc::now().timestamp_millis(), |max| max + 1);
        self.next_id.store(next, Ordering::SeqCst);
    }
}
