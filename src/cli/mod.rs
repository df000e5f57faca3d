//! Command-line interface for tumble
//!
//! This module defines the CLI structure using clap derive macros.
//! Task commands live at the top level; subtask and theme commands are
//! grouped under `sub` and `theme`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::output::OutputOptions;
use crate::state::StateHolder;
use crate::storage::Storage;
use crate::subtask::SubtaskService;
use crate::task::TaskService;
use crate::theme::ThemeService;

mod subtask;
mod task;
mod theme;

/// tumble - a local to-do manager
///
/// Tasks and subtasks with ordered lists, completion filters, and themes,
/// persisted to a per-user data directory.
#[derive(Parser, Debug)]
#[command(name = "tumble")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the per-user data dir)
    #[arg(long, global = true, env = "TUMBLE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task at the end of the list
    Add {
        /// Task description
        text: String,
    },

    /// List tasks, sorted by position
    List {
        /// Completion filter: all, active, completed
        #[arg(long, default_value = "all")]
        filter: String,
    },

    /// Toggle a task's completion
    Toggle {
        /// Task id
        id: i64,
    },

    /// Toggle a task's subtask panel open/closed
    Expand {
        /// Task id
        id: i64,
    },

    /// Delete a task and its subtasks
    Delete {
        /// Task id
        id: i64,

        /// Leave the task's subtasks in place (they become orphaned)
        #[arg(long)]
        keep_subtasks: bool,
    },

    /// Move a task to a new position in the sorted list
    Move {
        /// Current position
        from: usize,

        /// Target position
        to: usize,
    },

    /// Remove every completed task
    Clear,

    /// Show active, completed, and total counts
    Counts,

    /// Show one task with its subtasks
    Show {
        /// Task id
        id: i64,
    },

    /// Subtask commands
    #[command(subcommand)]
    Sub(SubCommands),

    /// Show or change the theme
    Theme {
        /// Theme name: standard, light, darker
        name: Option<String>,
    },
}

/// Subtask subcommands, scoped to a parent task
#[derive(Subcommand, Debug)]
pub enum SubCommands {
    /// Add a subtask at the end of the parent's list
    Add {
        /// Parent task id
        task_id: i64,

        /// Subtask description
        text: String,
    },

    /// List the parent's subtasks, sorted by position
    List {
        /// Parent task id
        task_id: i64,
    },

    /// Toggle a subtask's completion
    Toggle {
        /// Parent task id
        task_id: i64,

        /// Subtask id
        id: i64,
    },

    /// Delete a subtask
    Delete {
        /// Parent task id
        task_id: i64,

        /// Subtask id
        id: i64,
    },

    /// Move a subtask to a new position within its parent
    Move {
        /// Parent task id
        task_id: i64,

        /// Current position
        from: usize,

        /// Target position
        to: usize,
    },

    /// Remove the parent's completed subtasks
    Clear {
        /// Parent task id
        task_id: i64,
    },
}

/// Wired-up application services
///
/// Construction order is the wiring-time discipline: one state holder,
/// shared by reference; the task service owns task writes, the subtask
/// service owns subtask writes.
pub struct App {
    pub state: Arc<StateHolder>,
    pub tasks: Arc<TaskService>,
    pub subtasks: Arc<SubtaskService>,
    pub themes: ThemeService,
}

impl App {
    /// Load config, resolve the data directory, and wire the services
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let config = Config::load()?;
        let root = data_dir
            .or_else(|| config.data_dir.clone())
            .unwrap_or_else(Storage::default_root);
        tracing::debug!(root = %root.display(), "opening data directory");

        let storage = Storage::new(root);
        let state = Arc::new(StateHolder::new(storage.clone()));
        let fall_window = Duration::from_millis(config.fall_ms);

        let tasks = Arc::new(TaskService::with_fall_window(
            Arc::clone(&state),
            fall_window,
        )?);
        let subtasks = Arc::new(SubtaskService::with_fall_window(
            Arc::clone(&state),
            Arc::clone(&tasks),
            fall_window,
        )?);
        let themes = ThemeService::with_fallback(storage, config.default_theme);

        Ok(Self {
            state,
            tasks,
            subtasks,
            themes,
        })
    }
}

impl Cli {
    /// Execute the parsed command
    pub fn run(self) -> Result<()> {
        let options = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let app = App::open(self.data_dir)?;

        match self.command {
            Commands::Add { text } => task::add(&app, &text, options),
            Commands::List { filter } => task::list(&app, &filter, options),
            Commands::Toggle { id } => task::toggle(&app, id, options),
            Commands::Expand { id } => task::expand(&app, id, options),
            Commands::Delete { id, keep_subtasks } => {
                task::delete(&app, id, keep_subtasks, options)
            }
            Commands::Move { from, to } => task::move_task(&app, from, to, options),
            Commands::Clear => task::clear(&app, options),
            Commands::Counts => task::counts(&app, options),
            Commands::Show { id } => task::show(&app, id, options),
            Commands::Sub(cmd) => match cmd {
                SubCommands::Add { task_id, text } => {
                    subtask::add(&app, task_id, &text, options)
                }
                SubCommands::List { task_id } => subtask::list(&app, task_id, options),
                SubCommands::Toggle { task_id, id } => {
                    subtask::toggle(&app, task_id, id, options)
                }
                SubCommands::Delete { task_id, id } => {
                    subtask::delete(&app, task_id, id, options)
                }
                SubCommands::Move { task_id, from, to } => {
                    subtask::move_subtask(&app, task_id, from, to, options)
                }
                SubCommands::Clear { task_id } => subtask::clear(&app, task_id, options),
            },
            Commands::Theme { name } => theme::run(&app, name.as_deref(), options),
        }
    }
}
