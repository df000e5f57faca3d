//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use tempfile::TempDir;

use tumble::state::StateHolder;
use tumble::storage::Storage;
use tumble::subtask::SubtaskService;
use tumble::task::TaskService;

/// Wired services over a temporary data directory
pub struct TestApp {
    pub dir: TempDir,
    pub state: Arc<StateHolder>,
    pub tasks: Arc<TaskService>,
    pub subtasks: Arc<SubtaskService>,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        Self::open(dir)
    }

    /// Wire services over an existing data directory
    pub fn open(dir: TempDir) -> Self {
        let storage = Storage::new(dir.path().to_path_buf());
        let state = Arc::new(StateHolder::new(storage));
        let tasks = Arc::new(TaskService::new(Arc::clone(&state)).expect("task service"));
        let subtasks =
            Arc::new(SubtaskService::new(Arc::clone(&state), Arc::clone(&tasks)).expect(
                "subtask service",
            ));
        Self {
            dir,
            state,
            tasks,
            subtasks,
        }
    }

    /// Tear down the services and rebuild them over the same data directory,
    /// as a fresh app start would.
    pub fn reopen(self) -> Self {
        let TestApp { dir, .. } = self;
        Self::open(dir)
    }

    /// Add a task and return its id
    pub fn add_task(&self, text: &str) -> i64 {
        self.tasks.add_task(text).expect("add task");
        self.tasks
            .current_tasks()
            .into_iter()
            .find(|t| t.text == text)
            .expect("added task")
            .id
    }

    /// Add a subtask and return its id
    pub fn add_subtask(&self, task_id: i64, text: &str) -> i64 {
        self.subtasks.add_subtask(task_id, text).expect("add subtask");
        self.subtasks
            .subtasks_for_task(task_id)
            .into_iter()
            .find(|s| s.text == text)
            .expect("added subtask")
            .id
    }

    /// Task order values in sorted order
    pub fn task_orders(&self) -> Vec<i64> {
        let mut orders: Vec<i64> = self.tasks.current_tasks().iter().map(|t| t.order).collect();
        orders.sort_unstable();
        orders
    }

    /// One parent's subtask order values in sorted order
    pub fn subtask_orders(&self, task_id: i64) -> Vec<i64> {
        self.subtasks
            .subtasks_for_task(task_id)
            .iter()
            .map(|s| s.order)
            .collect()
    }
}

/// Assert that the order values form exactly the dense sequence 0..n-1
pub fn assert_dense(orders: &[i64]) {
    let expected: Vec<i64> = (0..orders.len() as i64).collect();
    assert_eq!(orders, expected, "order values must be dense 0..n-1");
}
