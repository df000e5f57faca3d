//! Central state holder for tasks and subtasks.
//!
//! The single source of truth for both collections, published through
//! `tokio::sync::watch` channels: every state change delivers the complete
//! new collection (not a diff) to every subscriber, and a new subscriber
//! immediately observes the latest value.
//!
//! All mutation is by wholesale replacement of a collection, never in-place
//! edits of shared elements. The holder is shared via `Arc` at wiring time;
//! the discipline is single-writer-per-collection: only the task service
//! writes tasks, only the subtask service writes subtasks. The two
//! collections persist independently, so a storage failure between the two
//! writes can leave them inconsistent on disk; that is accepted.

use tokio::sync::watch;

use crate::error::Result;
use crate::model::{Subtask, Task};
use crate::storage::{Storage, SUBTASKS_KEY, TASKS_KEY};

/// In-memory authoritative copy of tasks and subtasks, backed by [`Storage`]
#[derive(Debug)]
pub struct StateHolder {
    storage: Storage,
    tasks: watch::Sender<Vec<Task>>,
    subtasks: watch::Sender<Vec<Subtask>>,
}

impl StateHolder {
    /// Create an empty holder over the given store
    pub fn new(storage: Storage) -> Self {
        let (tasks, _) = watch::channel(Vec::new());
        let (subtasks, _) = watch::channel(Vec::new());
        Self {
            storage,
            tasks,
            subtasks,
        }
    }

    // =========================================================================
    // Snapshots and subscriptions
    // =========================================================================

    /// Synchronous snapshot of the current task collection
    pub fn current_tasks(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    /// Synchronous snapshot of the current subtask collection
    pub fn current_subtasks(&self) -> Vec<Subtask> {
        self.subtasks.borrow().clone()
    }

    /// Subscribe to task collection changes; replays the latest value
    pub fn subscribe_tasks(&self) -> watch::Receiver<Vec<Task>> {
        self.tasks.subscribe()
    }

    /// Subscribe to subtask collection changes; replays the latest value
    pub fn subscribe_subtasks(&self) -> watch::Receiver<Vec<Subtask>> {
        self.subtasks.subscribe()
    }

    // =========================================================================
    // Updates and persistence
    // =========================================================================

    /// Replace the in-memory task collection and notify all subscribers
    ///
    /// Always marks the channel changed, so republishing an identical
    /// collection still wakes subscribers.
    pub fn update_tasks(&self, tasks: Vec<Task>) {
        self.tasks.send_replace(tasks);
    }

    /// Replace the in-memory subtask collection and notify all subscribers
    pub fn update_subtasks(&self, subtasks: Vec<Subtask>) {
        self.subtasks.send_replace(subtasks);
    }

    /// Persist the task collection, then update and notify
    ///
    /// A storage failure propagates before the in-memory state changes.
    pub fn save_tasks(&self, tasks: Vec<Task>) -> Result<()> {
        self.storage.write_collection(TASKS_KEY, &tasks)?;
        self.update_tasks(tasks);
        Ok(())
    }

    /// Persist the subtask collection, then update and notify
    pub fn save_subtasks(&self, subtasks: Vec<Subtask>) -> Result<()> {
        self.storage.write_collection(SUBTASKS_KEY, &subtasks)?;
        self.update_subtasks(subtasks);
        Ok(())
    }

    /// Load the persisted task collection; absent or malformed data is empty
    pub fn load_tasks(&self) -> Vec<Task> {
        self.storage.read_collection(TASKS_KEY)
    }

    /// Load the persisted subtask collection
    pub fn load_subtasks(&self) -> Vec<Subtask> {
        self.storage.read_collection(SUBTASKS_KEY)
    }

    /// The underlying store
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    // =========================================================================
    // Derived queries
    // =========================================================================

    /// Whether the task has any subtasks
    pub fn task_has_subtasks(&self, task_id: i64) -> bool {
        self.subtasks.borrow().iter().any(|s| s.task_id == task_id)
    }

    /// The task's subtasks, sorted by order
    pub fn subtasks_for_task(&self, task_id: i64) -> Vec<Subtask> {
        let mut subtasks: Vec<Subtask> = self
            .subtasks
            .borrow()
            .iter()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect();
        subtasks.sort_by_key(|s| s.order);
        subtasks
    }

    /// Number of subtasks belonging to the task
    pub fn subtask_count(&self, task_id: i64) -> usize {
        self.subtasks
            .borrow()
            .iter()
            .filter(|s| s.task_id == task_id)
            .count()
    }

    /// Number of completed subtasks belonging to the task
    pub fn completed_subtask_count(&self, task_id: i64) -> usize {
        self.subtasks
            .borrow()
            .iter()
            .filter(|s| s.task_id == task_id && s.completed)
            .count()
    }

    /// Completion percentage: round(100 * completed / total), 0 when empty
    pub fn completion_percentage(&self, task_id: i64) -> u32 {
        let total = self.subtask_count(task_id);
        if total == 0 {
            return 0;
        }
        let completed = self.completed_subtask_count(task_id);
        (completed as f64 / total as f64 * 100.0).round() as u32
    }

    /// Whether the task has subtasks and every one of them is completed
    ///
    /// An empty subtask set counts as NOT all-completed, so a subtask-less
    /// task is never marked complete through this path.
    pub fn all_subtasks_completed(&self, task_id: i64) -> bool {
        let subtasks = self.subtasks.borrow();
        let mut any = false;
        for subtask in subtasks.iter().filter(|s| s.task_id == task_id) {
            if !subtask.completed {
                return false;
            }
            any = true;
        }
        any
    }
}
