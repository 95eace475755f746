//! Configuration loading and management
//!
//! Handles parsing of `desktodo.toml` configuration files. Everything has a
//! default, so running without a config file is the common case.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::undo::DEFAULT_UNDO_CAPACITY;

pub const CONFIG_FILE: &str = "desktodo.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory holding the task and settings files. Defaults to the
    /// platform data directory for the application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Maximum number of undo entries kept before the oldest is evicted
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,

    /// Notification sink destination: absent disables emission, `-` writes
    /// to stdout, anything else is treated as a file path to append to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<String>,
}

fn default_undo_capacity() -> usize {
    DEFAULT_UNDO_CAPACITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            undo_capacity: default_undo_capacity(),
            notifications: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `desktodo.toml` from a directory, or return defaults when the
    /// file does not exist. A present but malformed file is an error.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the data directory: the configured override, or the platform
    /// data directory for the application.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_data_dir(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.undo_capacity == 0 {
            return Err(Error::InvalidConfig(
                "undo_capacity must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform data directory for the application.
pub fn default_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "desktodo").ok_or_else(|| {
        Error::InvalidConfig("could not determine a platform data directory".to_string())
    })?;
    Ok(dirs.data_dir().to_path_buf())
}
