//! Theme selection for tumble.
//!
//! A persisted enum published the same way as the collections: replay-latest
//! watch channel, storage under the `savedTheme` key. An unknown or missing
//! stored value falls back to the standard theme.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::storage::{Storage, THEME_KEY};

/// Visual theme for the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Standard,
    Light,
    Darker,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Standard, Theme::Light, Theme::Darker];
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Theme::Standard),
            "light" => Ok(Theme::Light),
            "darker" => Ok(Theme::Darker),
            other => Err(Error::UnknownTheme(other.to_string())),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Standard => write!(f, "standard"),
            Theme::Light => write!(f, "light"),
            Theme::Darker => write!(f, "darker"),
        }
    }
}

/// Persisted theme selection with live publication
#[derive(Debug)]
pub struct ThemeService {
    storage: Storage,
    theme: watch::Sender<Theme>,
}

impl ThemeService {
    /// Load the saved theme, falling back to [`Theme::Standard`]
    pub fn new(storage: Storage) -> Self {
        Self::with_fallback(storage, Theme::Standard)
    }

    /// Load the saved theme, falling back to the given default
    pub fn with_fallback(storage: Storage, fallback: Theme) -> Self {
        let saved = storage.read_value::<Theme>(THEME_KEY).unwrap_or(fallback);
        let (theme, _) = watch::channel(saved);
        Self { storage, theme }
    }

    /// The currently selected theme
    pub fn current(&self) -> Theme {
        *self.theme.borrow()
    }

    /// Persist and publish a new theme selection
    pub fn set(&self, theme: Theme) -> Result<()> {
        self.storage.write_value(THEME_KEY, &theme)?;
        self.theme.send_replace(theme);
        Ok(())
    }

    /// Subscribe to theme changes; replays the latest value
    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.theme.subscribe()
    }
}
