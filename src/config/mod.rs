//! Configuration for the key share vault
//!
//! Settings are resolved in this order:
//! 1. Built-in defaults (`./keyShares.db`, master key in `ENCRYPTION_KEY`)
//! 2. An optional JSON config file
//! 3. Environment variables, which override both
//!
//! The master key itself is never part of `Config`. Only the name of the
//! environment variable holding it is, so printing or serializing a config
//! cannot leak key material.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the 32-byte master key
pub const ENCRYPTION_KEY_ENV: &str = "ENCRYPTION_KEY";

/// Environment variable overriding the database file location
pub const DATABASE_PATH_ENV: &str = "KEY_SHARES_DB_PATH";

/// Database file used when nothing else is configured
pub const DEFAULT_DATABASE_PATH: &str = "./keyShares.db";

fn default_max_connections() -> u32 {
    1
}

fn default_master_key_env() -> String {
    ENCRYPTION_KEY_ENV.to_string()
}

/// Share store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file (created if missing, parent directory must exist)
    pub database_path: PathBuf,
    /// Pool size. One connection keeps a single logical owner of the file.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl StoreConfig {
    /// Store settings for an explicit database file
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PATH)
    }
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Share store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Name of the environment variable holding the master key
    #[serde(default = "default_master_key_env")]
    pub master_key_env: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            master_key_env: default_master_key_env(),
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a JSON config file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
            if !path.is_empty() {
                tracing::debug!(path = %path, "Using {} for share database", DATABASE_PATH_ENV);
                self.store.database_path = PathBuf::from(path);
            }
        }
    }
}
