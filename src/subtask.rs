//! Subtask operations for tumble.
//!
//! CRUD and queries over subtasks, scoped to a parent task. The id space is
//! global across all subtasks; the `order` field is dense 0..k-1 among
//! siblings of the same parent. Deletion follows the same two-phase fall
//! lifecycle as tasks.
//!
//! Completion cascades one way: after any mutation that affects membership
//! or completion, the parent task's `completed` flag is re-derived from its
//! subtasks. Completing a task never touches its subtasks.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::model::{Subtask, LEGACY_ORDER};
use crate::state::StateHolder;
use crate::task::{TaskService, FALL_WINDOW_MS};

/// CRUD and query operations over subtasks
#[derive(Debug)]
pub struct SubtaskService {
    state: Arc<StateHolder>,
    tasks: Arc<TaskService>,
    fall_window: Duration,
    next_id: AtomicI64,
}

impl SubtaskService {
    /// Create the service, normalizing and republishing persisted subtasks
    pub fn new(state: Arc<StateHolder>, tasks: Arc<TaskService>) -> Result<Self> {
        Self::with_fall_window(state, tasks, Duration::from_millis(FALL_WINDOW_MS))
    }

    /// Create the service with an explicit fall window
    pub fn with_fall_window(
        state: Arc<StateHolder>,
        tasks: Arc<TaskService>,
        fall_window: Duration,
    ) -> Result<Self> {
        let mut subtasks = state.load_subtasks();
        for (index, subtask) in subtasks.iter_mut().enumerate() {
            if subtask.order == LEGACY_ORDER {
                subtask.order = index as i64;
            }
        }
        state.save_subtasks(subtasks)?;

        let service = Self {
            state,
            tasks,
            fall_window,
            next_id: AtomicI64::new(0),
        };
        service.recompute_next_id();
        Ok(service)
    }

    /// Subscribe to subtask collection changes; replays the latest value
    pub fn subscribe(&self) -> watch::Receiver<Vec<Subtask>> {
        self.state.subscribe_subtasks()
    }

    /// Synchronous snapshot of the full subtask collection
    pub fn current_subtasks(&self) -> Vec<Subtask> {
        self.state.current_subtasks()
    }

    // =========================================================================
    // CRUD operations
    // =========================================================================

    /// Create a subtask at the end of its parent's list
    ///
    /// Whitespace-only text is silently rejected with no mutation.
    pub fn add_subtask(&self, task_id: i64, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(task_id, "ignoring empty subtask text");
            return Ok(());
        }

        let mut subtasks = self.current_subtasks();
        let order = subtasks
            .iter()
            .filter(|s| s.task_id == task_id)
            .map(|s| s.order)
            .max()
            .map_or(0, |max| max + 1);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(id, task_id, order, "adding subtask");
        subtasks.push(Subtask::new(id, task_id, text, order));
        self.state.save_subtasks(subtasks)?;
        self.propagate_parent_completion(task_id)
    }

    /// Flip the completion flag and bump `updated_at`
    ///
    /// Unknown ids persist the collection unchanged; the parent is still
    /// re-evaluated, which is a no-op when nothing changed.
    pub fn toggle_completion(&self, subtask_id: i64, task_id: i64) -> Result<()> {
        let subtasks = self
            .current_subtasks()
            .into_iter()
            .map(|mut subtask| {
                if subtask.id == subtask_id {
                    subtask.completed = !subtask.completed;
                    subtask.updated_at = Utc::now();
                }
                subtask
            })
            .collect();
        self.state.save_subtasks(subtasks)?;
        self.propagate_parent_completion(task_id)
    }

    /// Phase one of deletion: mark the subtask as falling and persist
    pub fn begin_delete(&self, subtask_id: i64) -> Result<()> {
        let subtasks = self
            .current_subtasks()
            .into_iter()
            .map(|mut subtask| {
                if subtask.id == subtask_id {
                    subtask.is_falling = true;
                }
                subtask
            })
            .collect();
        self.state.save_subtasks(subtasks)
    }

    /// Phase two of deletion: physically remove and renumber siblings
    ///
    /// Renumbering is scoped to the affected parent: its remaining subtasks
    /// settle on a dense 0..k-1, other parents' subtasks are untouched.
    pub fn finish_delete(&self, subtask_id: i64, task_id: i64) -> Result<()> {
        let remaining: Vec<Subtask> = self
            .current_subtasks()
            .into_iter()
            .filter(|s| s.id != subtask_id)
            .collect();
        let subtasks = renumber_for_task(remaining, task_id);

        tracing::debug!(subtask_id, task_id, "removing subtask");
        self.state.save_subtasks(subtasks)?;
        self.recompute_next_id();
        self.propagate_parent_completion(task_id)?;
        self.state.update_subtasks(self.current_subtasks());
        Ok(())
    }

    /// Two-phase delete with the fall window between the phases
    pub async fn delete_subtask(&self, subtask_id: i64, task_id: i64) -> Result<()> {
        self.begin_delete(subtask_id)?;
        tokio::time::sleep(self.fall_window).await;
        self.finish_delete(subtask_id, task_id)
    }

    /// Move a subtask within its parent's order-sorted list
    ///
    /// `from` and `to` are positions within the parent's sorted view.
    /// Out-of-range positions are rejected. Every subtask of the parent
    /// gets a fresh `updated_at`; other parents' subtasks are untouched.
    pub fn reorder(&self, task_id: i64, from: usize, to: usize) -> Result<()> {
        let (mut siblings, others): (Vec<Subtask>, Vec<Subtask>) = self
            .current_subtasks()
            .into_iter()
            .partition(|s| s.task_id == task_id);
        siblings.sort_by_key(|s| s.order);

        let len = siblings.len();
        if from >= len {
            return Err(Error::IndexOutOfRange { index: from, len });
        }
        if to >= len {
            return Err(Error::IndexOutOfRange { index: to, len });
        }

        let moved = siblings.remove(from);
        siblings.insert(to, moved);
        let now = Utc::now();
        for (index, subtask) in siblings.iter_mut().enumerate() {
            subtask.order = index as i64;
            subtask.updated_at = now;
        }

        let mut subtasks = others;
        subtasks.extend(siblings);
        self.state.save_subtasks(subtasks)
    }

    /// Cascade helper: remove every subtask of the given task
    ///
    /// Task deletion does not invoke this by itself; the caller that
    /// deletes a task is responsible for cascading, as the CLI does.
    pub fn delete_for_task(&self, task_id: i64) -> Result<()> {
        let subtasks: Vec<Subtask> = self
            .current_subtasks()
            .into_iter()
            .filter(|s| s.task_id != task_id)
            .collect();
        self.state.save_subtasks(subtasks)?;
        self.recompute_next_id();
        Ok(())
    }

    /// Remove the parent's completed subtasks and renumber the survivors
    pub fn clear_completed(&self, task_id: i64) -> Result<()> {
        let now = Utc::now();
        let remaining: Vec<Subtask> = self
            .current_subtasks()
            .into_iter()
            .filter(|s| s.task_id != task_id || !s.completed)
            .map(|mut subtask| {
                if subtask.task_id == task_id {
                    subtask.updated_at = now;
                }
                subtask
            })
            .collect();
        let subtasks = renumber_for_task(remaining, task_id);

        self.state.save_subtasks(subtasks)?;
        self.propagate_parent_completion(task_id)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The parent's subtasks, sorted by order
    pub fn subtasks_for_task(&self, task_id: i64) -> Vec<Subtask> {
        self.state.subtasks_for_task(task_id)
    }

    pub fn subtask_count(&self, task_id: i64) -> usize {
        self.state.subtask_count(task_id)
    }

    pub fn completed_subtask_count(&self, task_id: i64) -> usize {
        self.state.completed_subtask_count(task_id)
    }

    pub fn completion_percentage(&self, task_id: i64) -> u32 {
        self.state.completion_percentage(task_id)
    }

    pub fn task_has_subtasks(&self, task_id: i64) -> bool {
        self.state.task_has_subtasks(task_id)
    }

    /// Re-derive the parent's completion from its subtasks
    ///
    /// One-way cascade: toggles the parent only when the derived value
    /// differs from its current flag, so re-running is idempotent. A task
    /// with no subtasks derives to not-completed and is never auto-completed
    /// through this path.
    fn propagate_parent_completion(&self, task_id: i64) -> Result<()> {
        let all_completed = self.state.all_subtasks_completed(task_id);
        if let Some(task) = self.tasks.task_by_id(task_id) {
            if task.completed != all_completed {
                tracing::debug!(task_id, all_completed, "deriving parent completion");
                self.tasks.toggle_completion(task_id)?;
            }
        }
        Ok(())
    }

    /// Seed the id counter one past the maximum existing id, or 0 when the
    /// collection is empty. The id space is global across all parents.
    fn recompute_next_id(&self) {
        let next = self
            .current_subtasks()
            .iter()
            .map(|s| s.id)
            .max()
            .map_or(0, |max| max + 1);
        self.next_id.store(next, Ordering::SeqCst);
    }
}

/// Renumber one parent's subtasks to a dense 0..k-1 by their sorted order,
/// leaving other parents' subtasks untouched.
fn renumber_for_task(subtasks: Vec<Subtask>, task_id: i64) -> Vec<Subtask> {
    let (mut siblings, others): (Vec<Subtask>, Vec<Subtask>) =
        subtasks.into_iter().partition(|s| s.task_id == task_id);
    siblings.sort_by_key(|s| s.order);
    for (index, subtask) in siblings.iter_mut().enumerate() {
        subtask.order = index as i64;
    }

    let mut merged = others;
    merged.extend(siblings);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::storage::Storage;

    fn services() -> (TempDir, Arc<TaskService>, SubtaskService) {
        let temp = TempDir::new().unwrap();
        let state = Arc::new(StateHolder::new(Storage::new(temp.path().to_path_buf())));
        let tasks = Arc::new(TaskService::new(Arc::clone(&state)).unwrap());
        let subtasks = SubtaskService::new(state, Arc::clone(&tasks)).unwrap();
        (temp, tasks, subtasks)
    }

    fn parent(tasks: &TaskService, text: &str) -> i64 {
        tasks.add_task(text).unwrap();
        tasks
            .current_tasks()
            .into_iter()
            .find(|t| t.text == text)
            .unwrap()
            .id
    }

    #[test]
    fn add_scopes_order_per_parent_and_ids_globally() {
        let (_temp, tasks, subtasks) = services();
        let first = parent(&tasks, "first");
        let second = parent(&tasks, "second");

        subtasks.add_subtask(first, "a").unwrap();
        subtasks.add_subtask(second, "b").unwrap();
        subtasks.add_subtask(first, "c").unwrap();

        let of_first = subtasks.subtasks_for_task(first);
        assert_eq!(of_first[0].order, 0);
        assert_eq!(of_first[1].order, 1);
        assert_eq!(subtasks.subtasks_for_task(second)[0].order, 0);

        let ids: Vec<i64> = subtasks.current_subtasks().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn add_rejects_whitespace_text() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        subtasks.add_subtask(id, "  \t ").unwrap();
        assert_eq!(subtasks.subtask_count(id), 0);
    }

    #[test]
    fn completing_every_subtask_completes_the_parent_once() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        subtasks.add_subtask(id, "one").unwrap();
        subtasks.add_subtask(id, "two").unwrap();
        let children = subtasks.subtasks_for_task(id);

        subtasks.toggle_completion(children[0].id, id).unwrap();
        assert!(!tasks.task_by_id(id).unwrap().completed);

        subtasks.toggle_completion(children[1].id, id).unwrap();
        assert!(tasks.task_by_id(id).unwrap().completed);

        // Re-evaluating an already all-completed set does not re-toggle.
        subtasks.clear_completed(id).unwrap();
        subtasks.add_subtask(id, "three").unwrap();
        assert!(!tasks.task_by_id(id).unwrap().completed);
    }

    #[test]
    fn uncompleting_a_subtask_uncompletes_the_parent() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        subtasks.add_subtask(id, "one").unwrap();
        subtasks.add_subtask(id, "two").unwrap();
        let children = subtasks.subtasks_for_task(id);

        subtasks.toggle_completion(children[0].id, id).unwrap();
        subtasks.toggle_completion(children[1].id, id).unwrap();
        assert!(tasks.task_by_id(id).unwrap().completed);

        subtasks.toggle_completion(children[0].id, id).unwrap();
        assert!(!tasks.task_by_id(id).unwrap().completed);
    }

    #[test]
    fn adding_a_subtask_never_completes_a_parent_without_completed_children() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        subtasks.add_subtask(id, "one").unwrap();
        assert!(!tasks.task_by_id(id).unwrap().completed);
    }

    #[test]
    fn two_phase_delete_renumbers_only_the_affected_parent() {
        let (_temp, tasks, subtasks) = services();
        let left = parent(&tasks, "left");
        let right = parent(&tasks, "right");
        subtasks.add_subtask(left, "a").unwrap();
        subtasks.add_subtask(left, "b").unwrap();
        subtasks.add_subtask(right, "x").unwrap();
        subtasks.add_subtask(right, "y").unwrap();

        let doomed = subtasks.subtasks_for_task(left)[0].id;
        subtasks.begin_delete(doomed).unwrap();
        assert!(subtasks
            .current_subtasks()
            .iter()
            .find(|s| s.id == doomed)
            .unwrap()
            .is_falling);

        subtasks.finish_delete(doomed, left).unwrap();

        let of_left = subtasks.subtasks_for_task(left);
        assert_eq!(of_left.len(), 1);
        assert_eq!(of_left[0].order, 0);

        let of_right = subtasks.subtasks_for_task(right);
        assert_eq!(of_right[0].order, 0);
        assert_eq!(of_right[1].order, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_subtask_waits_out_the_fall_window() {
        let temp = TempDir::new().unwrap();
        let state = Arc::new(StateHolder::new(Storage::new(temp.path().to_path_buf())));
        let tasks = Arc::new(TaskService::new(Arc::clone(&state)).unwrap());
        let subtasks = SubtaskService::new(state, Arc::clone(&tasks)).unwrap();

        let id = parent(&tasks, "parent");
        subtasks.add_subtask(id, "doomed").unwrap();
        let subtask_id = subtasks.subtasks_for_task(id)[0].id;

        subtasks.delete_subtask(subtask_id, id).await.unwrap();
        assert_eq!(subtasks.subtask_count(id), 0);
    }

    #[test]
    fn deleting_the_last_incomplete_subtask_completes_the_parent() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        subtasks.add_subtask(id, "done").unwrap();
        subtasks.add_subtask(id, "open").unwrap();
        let children = subtasks.subtasks_for_task(id);

        subtasks.toggle_completion(children[0].id, id).unwrap();
        subtasks.begin_delete(children[1].id).unwrap();
        subtasks.finish_delete(children[1].id, id).unwrap();

        assert!(tasks.task_by_id(id).unwrap().completed);
    }

    #[test]
    fn reorder_moves_within_the_parent_only() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        let other = parent(&tasks, "other");
        subtasks.add_subtask(id, "a").unwrap();
        subtasks.add_subtask(id, "b").unwrap();
        subtasks.add_subtask(id, "c").unwrap();
        subtasks.add_subtask(other, "x").unwrap();

        subtasks.reorder(id, 0, 2).unwrap();

        let siblings = subtasks.subtasks_for_task(id);
        assert_eq!(siblings[0].text, "b");
        assert_eq!(siblings[1].text, "c");
        assert_eq!(siblings[2].text, "a");
        assert_eq!(subtasks.subtasks_for_task(other)[0].order, 0);
    }

    #[test]
    fn reorder_rejects_out_of_range_positions() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        subtasks.add_subtask(id, "only").unwrap();
        assert!(matches!(
            subtasks.reorder(id, 1, 0),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn cascade_delete_removes_the_parents_subtasks_only() {
        let (_temp, tasks, subtasks) = services();
        let doomed = parent(&tasks, "doomed");
        let kept = parent(&tasks, "kept");
        subtasks.add_subtask(doomed, "a").unwrap();
        subtasks.add_subtask(kept, "b").unwrap();

        subtasks.delete_for_task(doomed).unwrap();

        assert_eq!(subtasks.subtask_count(doomed), 0);
        assert_eq!(subtasks.subtask_count(kept), 1);
    }

    #[test]
    fn clear_completed_is_scoped_to_one_parent() {
        let (_temp, tasks, subtasks) = services();
        let id = parent(&tasks, "parent");
        let other = parent(&tasks, "other");
        subtasks.add_subtask(id, "done").unwrap();
        subtasks.add_subtask(id, "open").unwrap();
        subtasks.add_subtask(other, "done elsewhere").unwrap();
        let children = subtasks.subtasks_for_task(id);
        let elsewhere = subtasks.subtasks_for_task(other)[0].id;

        subtasks.toggle_completion(children[0].id, id).unwrap();
        subtasks.toggle_completion(elsewhere, other).unwrap();
        subtasks.clear_completed(id).unwrap();

        let siblings = subtasks.subtasks_for_task(id);
        assert_eq!(siblings.len(), 1);
        assert_eq!(siblings[0].text, "open");
        assert_eq!(siblings[0].order, 0);
        assert_eq!(subtasks.subtask_count(other), 1);
    }

    #[test]
    fn init_backfills_legacy_order_and_seeds_ids() {
        let temp = TempDir::new().unwrap();
        let storage = Storage::new(temp.path().to_path_buf());
        std::fs::write(
            storage.key_path(crate::storage::SUBTASKS_KEY),
            r#"[{"id":5,"taskId":1,"text":"old","completed":false}]"#,
        )
        .unwrap();

        let state = Arc::new(StateHolder::new(storage));
        let tasks = Arc::new(TaskService::new(Arc::clone(&state)).unwrap());
        let subtasks = SubtaskService::new(state, tasks).unwrap();

        let stored = subtasks.current_subtasks();
        assert_eq!(stored[0].order, 0);

        subtasks.add_subtask(1, "fresh").unwrap();
        let fresh = subtasks
            .current_subtasks()
            .into_iter()
            .find(|s| s.text == "fresh")
            .unwrap();
        assert_eq!(fresh.id, 6);
    }
}
