//! Device registry
//!
//! This module owns device records:
//! - Sequential id assignment starting at 1
//! - Owner capture at registration time
//! - Active/inactive status

use crate::{principal::Principal, require_text, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registered piece of medical equipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Registry-assigned id, never reused
    pub id: u64,
    /// Display name (e.g. "MRI Scanner")
    pub name: String,
    /// Manufacturer model designation
    pub model: String,
    /// Manufacturer serial number
    pub serial_number: String,
    /// Manufacturer name
    pub manufacturer: String,
    /// Equipment category (e.g. "Imaging")
    pub category: String,
    /// Installation time as Unix seconds, as supplied by the caller
    pub installation_date: i64,
    /// Submitter of the registration transaction
    pub owner: Principal,
    /// Whether the device is in service
    pub active: bool,
}

/// Caller-supplied fields for a device registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    /// Display name
    pub name: String,
    /// Model designation
    pub model: String,
    /// Serial number
    pub serial_number: String,
    /// Manufacturer name
    pub manufacturer: String,
    /// Equipment category
    pub category: String,
    /// Installation time as Unix seconds
    pub installation_date: i64,
}

impl NewDevice {
    /// Build a registration request from its fields
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        serial_number: impl Into<String>,
        manufacturer: impl Into<String>,
        category: impl Into<String>,
        installation_date: i64,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            serial_number: serial_number.into(),
            manufacturer: manufacturer.into(),
            category: category.into(),
            installation_date,
        }
    }

    fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("model", &self.model)?;
        require_text("serial number", &self.serial_number)?;
        require_text("manufacturer", &self.manufacturer)?;
        require_text("category", &self.category)
    }
}

/// In-memory device registry with its own id sequence
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<u64, Device>,
    last_device_id: u64,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from stored records and its counter
    ///
    /// # Errors
    /// Returns `Error::Storage` unless the records carry exactly the ids
    /// `1..=device_count`.
    pub fn from_parts(devices: Vec<Device>, device_count: u64) -> Result<Self> {
        let mut map = BTreeMap::new();
        for device in devices {
            if device.id == 0 || device.id > device_count {
                return Err(Error::Storage(format!(
                    "device id {} outside counter range 1..={}",
                    device.id, device_count
                )));
            }
            if map.insert(device.id, device).is_some() {
                return Err(Error::Storage("duplicate device id in snapshot".to_string()));
            }
        }
        if map.len() as u64 != device_count {
            return Err(Error::Storage(format!(
                "device counter {} does not match {} stored records",
                device_count,
                map.len()
            )));
        }

        Ok(Self {
            devices: map,
            last_device_id: device_count,
        })
    }

    /// Register a device owned by `owner` and return its new id
    ///
    /// # Errors
    /// Returns `Error::Validation` if any text field is empty.
    pub fn register_device(&mut self, owner: &Principal, input: NewDevice) -> Result<u64> {
        input.validate()?;

        let id = self.last_device_id + 1;
        let device = Device {
            id,
            name: input.name,
            model: input.model,
            serial_number: input.serial_number,
            manufacturer: input.manufacturer,
            category: input.category,
            installation_date: input.installation_date,
            owner: owner.clone(),
            active: true,
        };

        self.devices.insert(id, device);
        self.last_device_id = id;
        Ok(id)
    }

    /// Set the active flag of a device
    ///
    /// # Errors
    /// Returns `Error::NotFound` if no device has this id.
    pub fn update_device_status(&mut self, device_id: u64, active: bool) -> Result<bool> {
        let device = self
            .devices
            .get_mut(&device_id)
            .ok_or_else(|| Error::NotFound(format!("device {}", device_id)))?;
        device.active = active;
        Ok(true)
    }

    /// Look up a device; `None` when the id is unknown
    pub fn get_device(&self, device_id: u64) -> Option<&Device> {
        self.devices.get(&device_id)
    }

    /// Number of devices ever registered
    pub fn device_count(&self) -> u64 {
        self.last_device_id
    }

    /// Whether a device with this id exists
    pub fn contains(&self, device_id: u64) -> bool {
        self.devices.contains_key(&device_id)
    }

    /// Devices registered by `owner`, in id order
    pub fn devices_by_owner(&self, owner: &Principal) -> Vec<&Device> {
        self.devices.values().filter(|d| &d.owner == owner).collect()
    }

    /// Devices currently in service, in id order
    pub fn active_devices(&self) -> Vec<&Device> {
        self.devices.values().filter(|d| d.active).collect()
    }

    /// All devices in id order
    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }
}
