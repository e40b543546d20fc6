//! Database configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::binary::Database;
use crate::encoding::Encoding;
use crate::error::{Error, Result};

/// Default database file name.
pub const DEFAULT_DATABASE: &str = "qqwry.dat";

/// Environment variable naming the database file.
pub const ENV_DATABASE: &str = "IPFINDER_DB";

/// Environment variable naming the string encoding.
pub const ENV_ENCODING: &str = "IPFINDER_ENCODING";

/// Environment variable enabling a full index check on load.
pub const ENV_VERIFY: &str = "IPFINDER_VERIFY";

/// Configuration for opening a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub path: PathBuf,
    /// Encoding of strings stored in the database
    pub encoding: Encoding,
    /// Walk the whole index after loading
    pub verify_on_load: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE),
            encoding: Encoding::default(),
            verify_on_load: false,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration for `path` with default settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from environment variables, falling back
    /// to defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(ENV_DATABASE) {
            config.path = PathBuf::from(path);
        }
        if let Ok(label) = std::env::var(ENV_ENCODING) {
            config.encoding = label.parse()?;
        }
        if let Ok(flag) = std::env::var(ENV_VERIFY) {
            config.verify_on_load = parse_bool(&flag)
                .ok_or_else(|| Error::Config(format!("invalid {}: {}", ENV_VERIFY, flag)))?;
        }
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save the configuration as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Open the configured database.
    pub fn open(&self) -> Result<Database> {
        let db = Database::open(&self.path)?;
        if self.verify_on_load {
            db.verify()?;
            log::debug!("Verified {} records in {:?}", db.record_count(), self.path);
        }
        Ok(db)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
