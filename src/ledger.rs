//! Ledger host surface
//!
//! The hosting ledger applies transactions one at a time in a total order.
//! `Ledger` models that: every call takes the single state lock, runs one
//! registry operation to completion and returns a settled result. Reads see
//! every write committed before them.

use crate::{
    clock::{Clock, SystemClock},
    config::LedgerConfig,
    device::{Device, DeviceRegistry, NewDevice},
    maintenance::{MaintenanceRegistry, MaintenanceTask, NewMaintenanceTask},
    principal::Principal,
    snapshot::LedgerSnapshot,
    store::Storage,
    Error, Result,
};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct LedgerState {
    devices: DeviceRegistry,
    maintenance: MaintenanceRegistry,
}

/// Shared, totally ordered access to both registries
///
/// Cloning is cheap; clones operate on the same state.
///
/// # Example
/// ```rust,no_run
/// use medtrack::{Ledger, NewDevice, Principal};
///
/// # async fn example() -> medtrack::Result<()> {
/// let ledger = Ledger::new();
/// let owner = Principal::new("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM")?;
///
/// let id = ledger
///     .register_device(
///         &owner,
///         NewDevice::new(
///             "MRI Scanner",
///             "HealthScan 5000",
///             "HS5K-12345",
///             "MedTech Industries",
///             "Imaging",
///             1625097600,
///         ),
///     )
///     .await?;
/// assert_eq!(id, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Ledger {
    state: Arc<Mutex<LedgerState>>,
    config: Arc<LedgerConfig>,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Create an empty ledger with default configuration and the system clock
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default(), Arc::new(SystemClock))
    }

    /// Create an empty ledger with explicit configuration and clock
    pub fn with_config(config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_state(LedgerState::default(), config, clock)
    }

    /// Resume a ledger from a snapshot
    ///
    /// # Errors
    /// Returns `Error::Storage` if the snapshot is inconsistent.
    pub fn from_snapshot(
        snapshot: LedgerSnapshot,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let (devices, maintenance) = snapshot.into_registries()?;
        tracing::info!(
            devices = devices.device_count(),
            tasks = maintenance.maintenance_count(),
            "Ledger restored from snapshot"
        );
        Ok(Self::from_state(
            LedgerState {
                devices,
                maintenance,
            },
            config,
            clock,
        ))
    }

    /// Resume a ledger from the last SQLite checkpoint
    ///
    /// # Errors
    /// Returns an error if the checkpoint cannot be read or is inconsistent.
    pub fn from_storage(
        storage: &Storage,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::from_snapshot(storage.load_snapshot()?, config, clock)
    }

    /// Open a ledger as configured
    ///
    /// When `database_path` is set the ledger resumes from that checkpoint
    /// database (an empty or new database yields an empty ledger); otherwise
    /// it starts empty.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or holds an
    /// inconsistent checkpoint.
    pub fn open(config: LedgerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        match Storage::from_config(&config)? {
            Some(storage) => Self::from_storage(&storage, config, clock),
            None => Ok(Self::with_config(config, clock)),
        }
    }

    fn from_state(state: LedgerState, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            config: Arc::new(config),
            clock,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========== Devices ==========

    /// Register a device on behalf of `caller`, who becomes its owner
    pub async fn register_device(&self, caller: &Principal, input: NewDevice) -> Result<u64> {
        let mut state = self.state.lock().await;
        match state.devices.register_device(caller, input) {
            Ok(id) => {
                tracing::info!(device_id = id, owner = %caller, "Device registered");
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(owner = %caller, "Device registration rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Set a device's active flag
    pub async fn update_device_status(&self, device_id: u64, active: bool) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.devices.update_device_status(device_id, active) {
            Ok(updated) => {
                tracing::info!(device_id, active, "Device status updated");
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!(device_id, "Device status update rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Look up a device
    pub async fn get_device(&self, device_id: u64) -> Option<Device> {
        self.state.lock().await.devices.get_device(device_id).cloned()
    }

    /// Number of devices ever registered
    pub async fn get_device_count(&self) -> u64 {
        self.state.lock().await.devices.device_count()
    }

    /// Devices owned by `owner`
    pub async fn devices_by_owner(&self, owner: &Principal) -> Vec<Device> {
        let state = self.state.lock().await;
        state.devices.devices_by_owner(owner).into_iter().cloned().collect()
    }

    // ========== Maintenance ==========

    /// Schedule maintenance on behalf of `caller`
    ///
    /// With `enforce_device_exists` configured, an unknown device id fails
    /// with `Error::NotFound` and consumes no task id.
    pub async fn schedule_maintenance(
        &self,
        caller: &Principal,
        input: NewMaintenanceTask,
    ) -> Result<u64> {
        let mut state = self.state.lock().await;
        let device_id = input.device_id;

        if self.config.enforce_device_exists && !state.devices.contains(device_id) {
            tracing::warn!(device_id, "Maintenance rejected for unregistered device");
            return Err(Error::NotFound(format!("device {}", device_id)));
        }

        match state.maintenance.schedule_maintenance(caller, input) {
            Ok(id) => {
                tracing::info!(
                    maintenance_id = id,
                    device_id,
                    created_by = %caller,
                    "Maintenance scheduled"
                );
                Ok(id)
            }
            Err(e) => {
                tracing::warn!(device_id, "Maintenance scheduling rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Complete a scheduled task at the ledger clock's current time
    pub async fn complete_maintenance(&self, maintenance_id: u64) -> Result<bool> {
        let mut state = self.state.lock().await;
        let now = self.clock.now();
        match state.maintenance.complete_maintenance(maintenance_id, now) {
            Ok(done) => {
                tracing::info!(maintenance_id, completed_date = now, "Maintenance completed");
                Ok(done)
            }
            Err(e) => {
                tracing::warn!(maintenance_id, "Maintenance completion rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Cancel a scheduled task
    pub async fn cancel_maintenance(&self, maintenance_id: u64) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state.maintenance.cancel_maintenance(maintenance_id) {
            Ok(done) => {
                tracing::info!(maintenance_id, "Maintenance cancelled");
                Ok(done)
            }
            Err(e) => {
                tracing::warn!(maintenance_id, "Maintenance cancellation rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Look up a maintenance task
    pub async fn get_maintenance_task(&self, maintenance_id: u64) -> Option<MaintenanceTask> {
        self.state
            .lock()
            .await
            .maintenance
            .get_maintenance_task(maintenance_id)
            .cloned()
    }

    /// Number of tasks ever scheduled
    pub async fn get_maintenance_count(&self) -> u64 {
        self.state.lock().await.maintenance.maintenance_count()
    }

    /// Maintenance history of a device
    pub async fn tasks_for_device(&self, device_id: u64) -> Vec<MaintenanceTask> {
        let state = self.state.lock().await;
        state
            .maintenance
            .tasks_for_device(device_id)
            .into_iter()
            .cloned()
            .collect()
    }

    // ========== Persistence ==========

    /// Capture the current state
    pub async fn snapshot(&self) -> LedgerSnapshot {
        let state = self.state.lock().await;
        LedgerSnapshot::capture(&state.devices, &state.maintenance)
    }

    /// Write the current state to a SQLite checkpoint
    pub async fn checkpoint(&self, storage: &mut Storage) -> Result<()> {
        let snapshot = self.snapshot().await;
        storage.save_snapshot(&snapshot)?;
        tracing::debug!(
            devices = snapshot.device_count,
            tasks = snapshot.maintenance_count,
            "Ledger checkpointed"
        );
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
