//! tumble - To-Do Library
//!
//! This library provides the core functionality for the tumble CLI tool:
//! tasks and subtasks with ordered lists, completion filters, theme
//! selection, and local JSON persistence.
//!
//! # Core Concepts
//!
//! - **Tasks and subtasks**: flat collections linked by `task_id`, with a
//!   dense 0-based `order` field per scope for display position
//! - **State holder**: single source of truth publishing full-collection
//!   snapshots over replay-latest watch channels
//! - **Two-phase deletion**: entities are marked falling for the animation
//!   window, then physically removed and renumbered
//! - **Parent-completion propagation**: a task's completion is derived
//!   one-way from its subtasks
//!
//! # Module Organization
//!
//! - `cli`: command-line interface using clap
//! - `config`: configuration loading from `tumble.toml`
//! - `error`: error types and result aliases
//! - `model`: task, subtask, and filter types
//! - `output`: shared CLI output formatting
//! - `state`: central state holder and derived queries
//! - `storage`: key-value JSON store over the data directory
//! - `subtask`: subtask CRUD and completion propagation
//! - `task`: task CRUD and queries
//! - `theme`: persisted theme selection

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;
pub mod subtask;
pub mod task;
pub mod theme;

pub use error::{Error, Result};
