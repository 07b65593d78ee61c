//! Whole-state snapshots
//!
//! A snapshot captures both registries, including their id counters, so a
//! host can persist and later resume a ledger. JSON is human-readable; CBOR
//! is the compact form.

use crate::{
    device::{Device, DeviceRegistry},
    maintenance::{MaintenanceRegistry, MaintenanceTask},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable copy of all ledger state
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Number of devices ever registered
    pub device_count: u64,
    /// Device records in id order
    pub devices: Vec<Device>,
    /// Number of tasks ever scheduled
    pub maintenance_count: u64,
    /// Maintenance tasks in id order
    pub maintenance_tasks: Vec<MaintenanceTask>,
}

impl LedgerSnapshot {
    /// Capture the current state of both registries
    pub fn capture(devices: &DeviceRegistry, maintenance: &MaintenanceRegistry) -> Self {
        Self {
            device_count: devices.device_count(),
            devices: devices.iter().cloned().collect(),
            maintenance_count: maintenance.maintenance_count(),
            maintenance_tasks: maintenance.iter().cloned().collect(),
        }
    }

    /// Rebuild both registries, validating counters against records
    ///
    /// # Errors
    /// Returns `Error::Storage` if the snapshot is internally inconsistent.
    pub fn into_registries(self) -> Result<(DeviceRegistry, MaintenanceRegistry)> {
        let devices = DeviceRegistry::from_parts(self.devices, self.device_count)?;
        let maintenance =
            MaintenanceRegistry::from_parts(self.maintenance_tasks, self.maintenance_count)?;
        Ok((devices, maintenance))
    }

    /// Save the snapshot as pretty JSON
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| Error::Storage(format!("Failed to write snapshot file: {}", e)))?;
        Ok(())
    }

    /// Load a JSON snapshot; a missing file yields an empty snapshot
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path_ref)
            .map_err(|e| Error::Storage(format!("Failed to read snapshot file: {}", e)))?;

        let snapshot: LedgerSnapshot = serde_json::from_str(&json)?;
        Ok(snapshot)
    }

    /// Save the snapshot in CBOR format
    ///
    /// # Errors
    /// Returns an error if serialization or the file write fails.
    pub fn save_cbor<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let cbor = serde_cbor::to_vec(self)
            .map_err(|e| Error::CborSerialization(format!("Failed to serialize snapshot: {}", e)))?;
        std::fs::write(path, cbor)
            .map_err(|e| Error::Storage(format!("Failed to write snapshot file: {}", e)))?;
        Ok(())
    }

    /// Load a CBOR snapshot; a missing file yields an empty snapshot
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or deserialized.
    pub fn load_cbor<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Ok(Self::default());
        }

        let cbor = std::fs::read(path_ref)
            .map_err(|e| Error::Storage(format!("Failed to read snapshot file: {}", e)))?;

        serde_cbor::from_slice(&cbor)
            .map_err(|e| Error::CborSerialization(format!("Failed to deserialize snapshot: {}", e)))
    }
}
