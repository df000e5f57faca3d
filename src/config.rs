//! Configuration loading and management
//!
//! Handles parsing of `tumble.toml` configuration files.
//!
//! The config file lives in the per-user config directory (e.g.
//! `~/.config/tumble/tumble.toml`) and can be pointed elsewhere with the
//! `TUMBLE_CONFIG` environment variable. A missing file yields defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::theme::Theme;

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "TUMBLE_CONFIG";

/// Config file name within the config directory
pub const CONFIG_FILE: &str = "tumble.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory override; storage resolution applies when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Fall animation window before physical removal, in milliseconds
    #[serde(default = "default_fall_ms")]
    pub fall_ms: u64,

    /// Theme applied when nothing has been saved yet
    #[serde(default)]
    pub default_theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            fall_ms: default_fall_ms(),
            default_theme: Theme::default(),
        }
    }
}

fn default_fall_ms() -> u64 {
    crate::task::FALL_WINDOW_MS
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Resolution order:
    /// 1. `TUMBLE_CONFIG` environment variable
    /// 2. `<user config dir>/tumble/tumble.toml`
    ///
    /// A missing file yields `Config::default()`; a malformed file is an
    /// error so a typo does not silently drop settings.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// The config file path, if one can be resolved
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        directories::ProjectDirs::from("", "", "tumble")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }
}
