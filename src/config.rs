//! Ledger configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Configuration for a [`Ledger`](crate::Ledger) host
///
/// Stored as JSON. A missing or empty file yields the defaults.
///
/// # Example
/// ```rust,no_run
/// use medtrack::LedgerConfig;
///
/// let mut config = LedgerConfig::load("medtrack.json").expect("Failed to load");
/// config.enforce_device_exists = true;
/// config.save("medtrack.json").expect("Failed to save");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Reject maintenance scheduled against unregistered devices
    pub enforce_device_exists: bool,
    /// Maximum log level (`trace`, `debug`, `info`, `warn`, `error`)
    pub log_level: String,
    /// SQLite checkpoint database, if any
    pub database_path: Option<String>,
}

impl LedgerConfig {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    /// Returns `Error::Storage` if the file exists but cannot be read or parsed.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("Failed to read config: {}", e)))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&data)
            .map_err(|e| Error::Storage(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration as pretty JSON, creating parent directories
    ///
    /// # Errors
    /// Returns `Error::Storage` on any filesystem or serialization failure.
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create config directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Storage(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, json)
            .map_err(|e| Error::Storage(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Parsed log level, `INFO` when unrecognised
    pub fn max_log_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enforce_device_exists: false,
            log_level: "info".to_string(),
            database_path: None,
        }
    }
}
