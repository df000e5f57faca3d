//! Storage layer for tumble
//!
//! A flat key-value store over a single data directory, one JSON file per
//! key:
//!
//! ```text
//! <data dir>/
//!   tasks.json       # full task collection
//!   subtasks.json    # full subtask collection
//!   savedTheme.json  # selected theme
//! ```
//!
//! Reads are tolerant: a missing file or malformed JSON yields the empty
//! value, since local data can be corrupted by external tampering. Writes
//! are atomic (temp file + rename) and failures propagate to the caller
//! with no retry.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Storage key for the task collection
pub const TASKS_KEY: &str = "tasks";

/// Storage key for the subtask collection
pub const SUBTASKS_KEY: &str = "subtasks";

/// Storage key for the selected theme
pub const THEME_KEY: &str = "savedTheme";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TUMBLE_DATA_DIR";

/// Key-value JSON store rooted at a data directory
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Create a store rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve the default data directory
    ///
    /// Resolution order:
    /// 1. `TUMBLE_DATA_DIR` environment variable
    /// 2. The per-user data directory (e.g. `~/.local/share/tumble`)
    /// 3. `./.tumble` as a last resort
    pub fn default_root() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }
        directories::ProjectDirs::from("", "", "tumble")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".tumble"))
    }

    /// The root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path holding the given storage key
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Read a collection stored under `key`
    ///
    /// An absent file or malformed content yields an empty collection.
    pub fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        self.read_value(key).unwrap_or_default()
    }

    /// Serialize a collection under `key`, atomically
    pub fn write_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        self.write_atomic(&self.key_path(key), json.as_bytes())
    }

    /// Read a single value stored under `key`, or `None` if absent or malformed
    pub fn read_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.key_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return None,
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, %err, "discarding malformed stored data");
                None
            }
        }
    }

    /// Serialize a single value under `key`, atomically
    pub fn write_value<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_atomic(&self.key_path(key), json.as_bytes())
    }

    /// Write data atomically using temp file + rename
    ///
    /// Readers never see partial writes: the file is either fully written
    /// or not at all.
    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;

        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
