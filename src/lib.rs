//! MedTrack - device registry and maintenance scheduling core
//!
//! This library provides the record-keeping core of a medical-equipment
//! asset-tracking ledger. The hosting ledger supplies ordering, identity and
//! persistence; this crate supplies the registries and their workflows.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod device;
pub mod ledger;
pub mod maintenance;
pub mod principal;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::LedgerConfig;
pub use device::{Device, DeviceRegistry, NewDevice};
pub use ledger::Ledger;
pub use maintenance::{MaintenanceRegistry, MaintenanceTask, NewMaintenanceTask, TaskStatus};
pub use principal::Principal;
pub use snapshot::LedgerSnapshot;
pub use store::Storage;

/// Result type alias for MedTrack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for MedTrack operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An input field was empty or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record id does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A status change was attempted on a task in a terminal state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Snapshot or configuration storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// CBOR serialization error
    #[error("CBOR serialization error: {0}")]
    CborSerialization(String),

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Reject empty or whitespace-only text fields
pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Initialize MedTrack logging with the default subscriber
pub fn init() {
    tracing_subscriber::fmt::init();
}

/// Initialize logging using the level named in the configuration
///
/// Unknown level names fall back to `info`. Calling this more than once is
/// harmless; only the first subscriber is installed.
pub fn init_with_config(config: &LedgerConfig) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(config.max_log_level())
        .try_init();
}

#[cfg(test)]
mod init_tests {
    use super::*;

    #[test]
    fn test_init_with_config_can_repeat() {
        let config = LedgerConfig {
            log_level: "warn".to_string(),
            ..LedgerConfig::default()
        };
        init_with_config(&config);
        init_with_config(&config);
    }
}
