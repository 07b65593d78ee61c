// Test modules for MedTrack
// Each module exercises the public surface of the corresponding source file

mod ledger_tests;

use crate::{NewDevice, NewMaintenanceTask, Principal};

pub(crate) const OWNER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
pub(crate) const SCHEDULER: &str = "ST2REHHS5J3CERCRBEPMGH7NIV22XCFT5TSMN2CO";

/// Helper to build a principal from a known-good identifier
pub(crate) fn principal(id: &str) -> Principal {
    Principal::new(id).expect("Failed to create principal")
}

/// The MRI scanner used throughout the device scenarios
pub(crate) fn mri_scanner() -> NewDevice {
    NewDevice::new(
        "MRI Scanner",
        "HealthScan 5000",
        "HS5K-12345",
        "MedTech Industries",
        "Imaging",
        1625097600,
    )
}

/// Annual calibration of the MRI scanner
pub(crate) fn calibration(device_id: u64) -> NewMaintenanceTask {
    NewMaintenanceTask::new(
        device_id,
        "calibration",
        "Annual calibration of MRI Scanner",
        1633046400,
        principal(OWNER),
    )
}
