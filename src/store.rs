//! SQLite checkpoint store
//!
//! Hosts that want durable state between restarts checkpoint the ledger into
//! SQLite and restore it on start-up. A checkpoint replaces the stored state
//! in a single transaction.

use crate::{
    config::LedgerConfig,
    device::Device,
    maintenance::{MaintenanceTask, TaskStatus},
    principal::Principal,
    snapshot::LedgerSnapshot,
    Error, Result,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

const DEVICE_COUNTER: &str = "device";
const MAINTENANCE_COUNTER: &str = "maintenance";

/// SQLite-based checkpoint storage
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (or create) a checkpoint database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open database: {}", e)))?;

        let storage = Self { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory storage instance (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Storage(format!("Failed to create in-memory database: {}", e)))?;

        let storage = Self { conn };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Open the checkpoint database named by `database_path`, if any
    pub fn from_config(config: &LedgerConfig) -> Result<Option<Self>> {
        config.database_path.as_deref().map(Self::new).transpose()
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                model TEXT NOT NULL,
                serial_number TEXT NOT NULL,
                manufacturer TEXT NOT NULL,
                category TEXT NOT NULL,
                installation_date INTEGER NOT NULL,
                owner TEXT NOT NULL,
                active INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS maintenance_tasks (
                id INTEGER PRIMARY KEY,
                device_id INTEGER NOT NULL,
                task_type TEXT NOT NULL,
                description TEXT NOT NULL,
                scheduled_date INTEGER NOT NULL,
                completed_date INTEGER,
                technician TEXT NOT NULL,
                status TEXT NOT NULL,
                created_by TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS counters (
                name TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_maintenance_device ON maintenance_tasks(device_id)",
            [],
        )?;

        Ok(())
    }

    /// Replace the stored state with `snapshot`
    pub fn save_snapshot(&mut self, snapshot: &LedgerSnapshot) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM devices", [])?;
        tx.execute("DELETE FROM maintenance_tasks", [])?;

        for device in &snapshot.devices {
            tx.execute(
                "INSERT INTO devices
                 (id, name, model, serial_number, manufacturer, category, installation_date, owner, active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    to_sql_id(device.id)?,
                    &device.name,
                    &device.model,
                    &device.serial_number,
                    &device.manufacturer,
                    &device.category,
                    device.installation_date,
                    device.owner.as_str(),
                    device.active as i32,
                ],
            )?;
        }

        for task in &snapshot.maintenance_tasks {
            tx.execute(
                "INSERT INTO maintenance_tasks
                 (id, device_id, task_type, description, scheduled_date, completed_date, technician, status, created_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    to_sql_id(task.id)?,
                    device_ref_to_sql(task.device_id),
                    &task.task_type,
                    &task.description,
                    task.scheduled_date,
                    task.completed_date,
                    task.technician.as_str(),
                    task.status.as_str(),
                    task.created_by.as_str(),
                ],
            )?;
        }

        for (name, value) in [
            (DEVICE_COUNTER, snapshot.device_count),
            (MAINTENANCE_COUNTER, snapshot.maintenance_count),
        ] {
            tx.execute(
                "INSERT OR REPLACE INTO counters (name, value) VALUES (?1, ?2)",
                params![name, to_sql_id(value)?],
            )?;
        }

        tx.commit()?;

        debug!(
            devices = snapshot.devices.len(),
            tasks = snapshot.maintenance_tasks.len(),
            "Checkpoint written"
        );
        Ok(())
    }

    /// Read the stored state; an empty database yields an empty snapshot
    pub fn load_snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(LedgerSnapshot {
            device_count: self.load_counter(DEVICE_COUNTER)?,
            devices: self.load_devices()?,
            maintenance_count: self.load_counter(MAINTENANCE_COUNTER)?,
            maintenance_tasks: self.load_maintenance_tasks()?,
        })
    }

    fn load_counter(&self, name: &str) -> Result<u64> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM counters WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        value.map_or(Ok(0), from_sql_id)
    }

    fn load_devices(&self) -> Result<Vec<Device>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, model, serial_number, manufacturer, category, installation_date, owner, active
             FROM devices ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, i32>(8)?,
            ))
        })?;

        let mut devices = Vec::new();
        for row in rows {
            let (
                id,
                name,
                model,
                serial_number,
                manufacturer,
                category,
                installation_date,
                owner,
                active,
            ) = row?;
            devices.push(Device {
                id: from_sql_id(id)?,
                name,
                model,
                serial_number,
                manufacturer,
                category,
                installation_date,
                owner: Principal::new(owner)?,
                active: active != 0,
            });
        }

        Ok(devices)
    }

    fn load_maintenance_tasks(&self) -> Result<Vec<MaintenanceTask>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, device_id, task_type, description, scheduled_date, completed_date, technician, status, created_by
             FROM maintenance_tasks ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, Option<i64>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut tasks = Vec::new();
        for row in rows {
            let (
                id,
                device_id,
                task_type,
                description,
                scheduled_date,
                completed_date,
                technician,
                status,
                created_by,
            ) = row?;
            tasks.push(MaintenanceTask {
                id: from_sql_id(id)?,
                device_id: device_ref_from_sql(device_id),
                task_type,
                description,
                scheduled_date,
                completed_date,
                technician: Principal::new(technician)?,
                status: status.parse::<TaskStatus>()?,
                created_by: Principal::new(created_by)?,
            });
        }

        Ok(tasks)
    }
}

fn to_sql_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::Storage(format!("id {} exceeds SQLite range", id)))
}

// Device references are caller-supplied and may use the full u64 range, so
// they are stored bit-for-bit rather than range-checked.
fn device_ref_to_sql(device_id: u64) -> i64 {
    device_id as i64
}

fn device_ref_from_sql(value: i64) -> u64 {
    value as u64
}

fn from_sql_id(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::Storage(format!("negative id {} in database", value)))
}
