//! Configuration management for unirank.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "unirank";

/// Default ranking data file name.
const DATA_FILE_NAME: &str = "universities.json";

/// Default local storage database file name.
const DATABASE_FILE_NAME: &str = "unirank.db";

/// Default remote note log database file name.
const REMOTE_DATABASE_FILE_NAME: &str = "remote-notes.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `UNIRANK_`, sections split on `__`)
/// 2. TOML config file at `~/.config/unirank/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ranking data source.
    pub data: DataConfig,
    /// Local storage configuration.
    pub storage: StorageConfig,
    /// Optional shared note log.
    pub remote: RemoteConfig,
    /// Interactive session settings.
    pub ui: UiConfig,
    /// CSV export settings.
    pub export: ExportConfig,
}

/// Ranking data configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the JSON ranking file.
    /// Defaults to `~/.local/share/unirank/universities.json`
    pub path: Option<PathBuf>,
}

/// Local storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the local database file.
    /// Defaults to `~/.local/share/unirank/unirank.db`
    pub database_path: Option<PathBuf>,
}

/// Remote note log configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Mirror notes to the shared log.
    pub enabled: bool,
    /// Path to the shared log database.
    /// Defaults to `~/.local/share/unirank/remote-notes.db`
    pub database_path: Option<PathBuf>,
    /// Collection the notes are written to.
    pub collection: String,
    /// Number of most recent notes a subscription delivers.
    pub subscribe_limit: usize,
    /// How often a live subscription checks for new notes, in milliseconds.
    pub poll_interval_ms: u64,
}

/// Interactive session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Delay used to coalesce rapid query edits, in milliseconds.
    pub debounce_ms: u64,
    /// Author recorded on notes when none is given.
    pub default_author: Option<String>,
}

/// Export configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the CSV export is written to.
    /// Defaults to the current directory.
    pub directory: Option<PathBuf>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            database_path: None,
            collection: "notes".to_string(),
            subscribe_limit: 200,
            poll_interval_ms: 1_000,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 180,
            default_author: None,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("UNIRANK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.remote.collection.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "remote.collection must not be empty".to_string(),
            });
        }

        if self.remote.subscribe_limit == 0 {
            return Err(Error::ConfigValidation {
                message: "remote.subscribe_limit must be greater than 0".to_string(),
            });
        }

        if self.remote.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "remote.poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.ui.debounce_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "ui.debounce_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the ranking data path, resolving defaults if not set.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.data
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME))
    }

    /// Get the local database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the remote log database path, resolving defaults if not set.
    #[must_use]
    pub fn remote_database_path(&self) -> PathBuf {
        self.remote
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(REMOTE_DATABASE_FILE_NAME))
    }

    /// Get the export directory, resolving defaults if not set.
    #[must_use]
    pub fn export_dir(&self) -> PathBuf {
        self.export
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the debounce delay as a Duration.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.ui.debounce_ms)
    }

    /// Get the remote poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.remote.poll_interval_ms)
    }
}
