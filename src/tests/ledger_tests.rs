use super::{calibration, mri_scanner, principal, OWNER, SCHEDULER};
use crate::clock::FixedClock;
use crate::config::LedgerConfig;
use crate::ledger::Ledger;
use crate::maintenance::TaskStatus;
use crate::Error;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

fn ledger_at(now: i64, enforce_device_exists: bool) -> (Ledger, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(now));
    let config = LedgerConfig {
        enforce_device_exists,
        ..LedgerConfig::default()
    };
    (Ledger::with_config(config, clock.clone()), clock)
}

#[tokio::test]
async fn test_mri_scanner_scenario() {
    let (ledger, _clock) = ledger_at(1633132800, false);
    let owner = principal(OWNER);

    let device_id = assert_ok!(ledger.register_device(&owner, mri_scanner()).await);
    assert_eq!(device_id, 1);

    let device = ledger.get_device(1).await.expect("Device should exist");
    assert_eq!(device.name, "MRI Scanner");
    assert_eq!(device.model, "HealthScan 5000");
    assert_eq!(device.serial_number, "HS5K-12345");
    assert_eq!(device.manufacturer, "MedTech Industries");
    assert_eq!(device.category, "Imaging");
    assert_eq!(device.installation_date, 1625097600);
    assert_eq!(device.owner, owner);
    assert!(device.active);

    let scheduler = principal(SCHEDULER);
    let task_id = assert_ok!(ledger.schedule_maintenance(&scheduler, calibration(1)).await);
    assert_eq!(task_id, 1);

    let task = ledger.get_maintenance_task(1).await.expect("Task should exist");
    assert_eq!(task.status.to_string(), "scheduled");
    assert_eq!(task.created_by, scheduler);

    assert!(assert_ok!(ledger.complete_maintenance(1).await));
    let task = ledger.get_maintenance_task(1).await.expect("Task should exist");
    assert_eq!(task.status.to_string(), "completed");
    assert_eq!(task.completed_date, Some(1633132800));
}

#[tokio::test]
async fn test_reads_reflect_status_updates() {
    let (ledger, _clock) = ledger_at(0, false);
    let owner = principal(OWNER);
    assert_ok!(ledger.register_device(&owner, mri_scanner()).await);

    assert!(assert_ok!(ledger.update_device_status(1, false).await));
    assert_eq!(ledger.get_device(1).await.map(|d| d.active), Some(false));

    assert!(assert_ok!(ledger.update_device_status(1, true).await));
    assert_eq!(ledger.get_device(1).await.map(|d| d.active), Some(true));
}

#[tokio::test]
async fn test_unknown_ids() {
    let (ledger, _clock) = ledger_at(0, false);

    assert!(ledger.get_device(1).await.is_none());
    assert!(ledger.get_maintenance_task(1).await.is_none());
    assert!(matches!(
        ledger.update_device_status(1, false).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        ledger.complete_maintenance(1).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        ledger.cancel_maintenance(1).await,
        Err(Error::NotFound(_))
    ));
    assert_eq!(ledger.get_device_count().await, 0);
    assert_eq!(ledger.get_maintenance_count().await, 0);
}

#[tokio::test]
async fn test_completion_uses_ledger_clock() {
    let (ledger, clock) = ledger_at(1_700_000_000, false);
    let scheduler = principal(SCHEDULER);

    assert_ok!(ledger.schedule_maintenance(&scheduler, calibration(1)).await);
    clock.advance(3600);
    assert_ok!(ledger.complete_maintenance(1).await);

    let task = ledger.get_maintenance_task(1).await.expect("Task should exist");
    assert_eq!(task.completed_date, Some(1_700_003_600));
}

#[tokio::test]
async fn test_cancel_then_complete_is_invalid_state() {
    let (ledger, _clock) = ledger_at(0, false);
    let scheduler = principal(SCHEDULER);
    assert_ok!(ledger.schedule_maintenance(&scheduler, calibration(1)).await);

    assert!(assert_ok!(ledger.cancel_maintenance(1).await));
    let err = assert_err!(ledger.complete_maintenance(1).await);
    assert!(matches!(err, Error::InvalidState(_)));

    let task = ledger.get_maintenance_task(1).await.expect("Task should exist");
    assert_eq!(task.status, TaskStatus::Cancelled);
    assert_eq!(task.completed_date, None);
}

#[tokio::test]
async fn test_permissive_scheduling_by_default() {
    let ledger = Ledger::new();
    let scheduler = principal(SCHEDULER);

    let id = assert_ok!(ledger.schedule_maintenance(&scheduler, calibration(42)).await);
    assert_eq!(id, 1);
}

#[tokio::test]
async fn test_enforced_device_existence() {
    let (ledger, _clock) = ledger_at(0, true);
    let owner = principal(OWNER);
    let scheduler = principal(SCHEDULER);

    let err = assert_err!(ledger.schedule_maintenance(&scheduler, calibration(1)).await);
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(ledger.get_maintenance_count().await, 0);

    assert_ok!(ledger.register_device(&owner, mri_scanner()).await);
    let id = assert_ok!(ledger.schedule_maintenance(&scheduler, calibration(1)).await);
    assert_eq!(id, 1, "Rejected scheduling should not consume an id");
}

#[tokio::test]
async fn test_device_and_task_sequences_are_independent() {
    let (ledger, _clock) = ledger_at(0, false);
    let owner = principal(OWNER);

    for _ in 0..3 {
        assert_ok!(ledger.register_device(&owner, mri_scanner()).await);
    }
    let task_id = assert_ok!(ledger.schedule_maintenance(&owner, calibration(3)).await);

    assert_eq!(task_id, 1);
    assert_eq!(ledger.get_device_count().await, 3);
    assert_eq!(ledger.get_maintenance_count().await, 1);
    assert_eq!(ledger.tasks_for_device(3).await.len(), 1);
    assert_eq!(ledger.devices_by_owner(&owner).await.len(), 3);
}

#[tokio::test]
async fn test_concurrent_registrations_get_unique_ids() {
    let ledger = Ledger::new();
    let mut handles = Vec::new();

    for _ in 0..20 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let owner = principal(OWNER);
            ledger.register_device(&owner, mri_scanner()).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        let id = handle
            .await
            .expect("Task panicked")
            .expect("Failed to register device");
        ids.push(id);
    }
    ids.sort_unstable();

    assert_eq!(ids, (1..=20).collect::<Vec<u64>>());
    assert_eq!(ledger.get_device_count().await, 20);
}

#[tokio::test]
async fn test_snapshot_restores_ledger() {
    let (ledger, _clock) = ledger_at(500, false);
    let owner = principal(OWNER);
    assert_ok!(ledger.register_device(&owner, mri_scanner()).await);
    assert_ok!(ledger.schedule_maintenance(&owner, calibration(1)).await);
    assert_ok!(ledger.complete_maintenance(1).await);

    let snapshot = ledger.snapshot().await;
    let restored = assert_ok!(Ledger::from_snapshot(
        snapshot,
        LedgerConfig::default(),
        Arc::new(FixedClock::new(0)),
    ));

    assert_eq!(restored.get_device_count().await, 1);
    assert_eq!(
        restored.get_maintenance_task(1).await.map(|t| t.completed_date),
        Some(Some(500))
    );

    // Counters continue from the restored state
    let next = assert_ok!(restored.register_device(&owner, mri_scanner()).await);
    assert_eq!(next, 2);
}
