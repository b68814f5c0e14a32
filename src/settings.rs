//! Persisted user settings.
//!
//! A single JSON file holding the last destination folder:
//!
//! ```json
//! { "last_destination": "/home/me/Pictures/scans" }
//! ```
//!
//! Reading and writing are best-effort: a missing or malformed file reads as
//! "nothing remembered" and write failures are only logged.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the settings file inside the home directory.
pub const SETTINGS_FILE_NAME: &str = ".pdf_to_jpg_settings.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_destination: Option<PathBuf>,
}

/// Handle to the settings file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.pdf_to_jpg_settings.json`, or `None` without a home directory.
    pub fn in_home_dir() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The remembered destination folder, if any.
    pub fn last_destination(&self) -> Option<PathBuf> {
        self.load().last_destination
    }

    /// Remember `destination` for the next session.
    ///
    /// Relative paths are stored resolved against the current directory.
    pub fn remember_destination(&self, destination: &Path) {
        let destination =
            std::path::absolute(destination).unwrap_or_else(|_| destination.to_path_buf());
        let mut settings = self.load();
        settings.last_destination = Some(destination);
        self.save(&settings);
    }

    fn load(&self) -> Settings {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No settings read from {}: {}", self.path.display(), e);
                return Settings::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Ignoring malformed settings {}: {}", self.path.display(), e);
            Settings::default()
        })
    }

    fn save(&self, settings: &Settings) {
        let result = serde_json::to_string_pretty(settings)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));
        if let Err(e) = result {
            warn!("Could not save settings to {}: {}", self.path.display(), e);
        }
    }
}
