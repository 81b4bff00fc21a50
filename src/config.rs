//! Persistent settings.
//!
//! Settings are stored as JSON in the platform config directory
//! (`config.json` under `ProjectDirs("com", "gphotos-dedupe", "gphotos-dedupe")`)
//! or in a file passed with `--config`. Command-line flags override them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::duplicates::DEFAULT_MARKER;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Substring identifying canonical (per-year) folders.
    pub marker: String,
    /// Ignore dot-files and dot-directories.
    pub skip_hidden: bool,
    /// Ignore zero-length files.
    pub skip_empty: bool,
    /// Re-check size and mtime before replacing a duplicate.
    pub verify_before_replace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            skip_hidden: false,
            skip_empty: false,
            verify_before_replace: true,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults on any problem.
    #[must_use]
    pub fn load() -> Self {
        let loaded = Self::config_path().and_then(|path| {
            if path.exists() {
                Self::load_from(&path)
            } else {
                Ok(Self::default())
            }
        });

        match loaded {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails if the directory or file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Default platform-specific config path.
    ///
    /// # Errors
    ///
    /// Fails when the home directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "gphotos-dedupe", "gphotos-dedupe")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(dirs.config_dir().join("config.json"))
    }
}
