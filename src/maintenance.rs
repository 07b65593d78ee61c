//! Maintenance scheduling registry
//!
//! This module owns maintenance tasks and their status workflow:
//! - Sequential task ids, independent of device ids
//! - `scheduled -> completed` and `scheduled -> cancelled` transitions
//! - Rejection of any transition out of a terminal state

use crate::{principal::Principal, require_text, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Workflow state of a maintenance task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Planned and awaiting work
    Scheduled,
    /// Work performed; terminal
    Completed,
    /// Called off before completion; terminal
    Cancelled,
}

impl TaskStatus {
    /// Textual form used on the wire and in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Scheduled => "scheduled",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is permitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(TaskStatus::Scheduled),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(Error::Validation(format!("unknown task status: {}", other))),
        }
    }
}

/// A maintenance task recorded against a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    /// Registry-assigned id, never reused
    pub id: u64,
    /// Device the work applies to
    pub device_id: u64,
    /// Kind of work (e.g. "calibration")
    pub task_type: String,
    /// Free-form description
    pub description: String,
    /// Planned time as Unix seconds
    pub scheduled_date: i64,
    /// Set only when the task completes
    pub completed_date: Option<i64>,
    /// Assigned technician
    pub technician: Principal,
    /// Current workflow state
    pub status: TaskStatus,
    /// Submitter of the scheduling transaction
    pub created_by: Principal,
}

/// Caller-supplied fields for scheduling a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaintenanceTask {
    /// Device the work applies to
    pub device_id: u64,
    /// Kind of work
    pub task_type: String,
    /// Free-form description
    pub description: String,
    /// Planned time as Unix seconds
    pub scheduled_date: i64,
    /// Assigned technician
    pub technician: Principal,
}

impl NewMaintenanceTask {
    /// Build a scheduling request from its fields
    pub fn new(
        device_id: u64,
        task_type: impl Into<String>,
        description: impl Into<String>,
        scheduled_date: i64,
        technician: Principal,
    ) -> Self {
        Self {
            device_id,
            task_type: task_type.into(),
            description: description.into(),
            scheduled_date,
            technician,
        }
    }

    fn validate(&self) -> Result<()> {
        require_text("task type", &self.task_type)?;
        require_text("description", &self.description)?;
        require_text("technician", self.technician.as_str())
    }
}

/// In-memory maintenance registry with its own id sequence
#[derive(Debug, Clone, Default)]
pub struct MaintenanceRegistry {
    tasks: BTreeMap<u64, MaintenanceTask>,
    last_task_id: u64,
}

impl MaintenanceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from stored tasks and its counter
    ///
    /// # Errors
    /// Returns `Error::Storage` unless the tasks carry exactly the ids
    /// `1..=task_count`, or if a task's completion date disagrees with its
    /// status.
    pub fn from_parts(tasks: Vec<MaintenanceTask>, task_count: u64) -> Result<Self> {
        let mut map = BTreeMap::new();
        for task in tasks {
            if task.id == 0 || task.id > task_count {
                return Err(Error::Storage(format!(
                    "maintenance id {} outside counter range 1..={}",
                    task.id, task_count
                )));
            }
            if task.completed_date.is_some() != (task.status == TaskStatus::Completed) {
                return Err(Error::Storage(format!(
                    "maintenance {} has completion date inconsistent with status {}",
                    task.id, task.status
                )));
            }
            if map.insert(task.id, task).is_some() {
                return Err(Error::Storage(
                    "duplicate maintenance id in snapshot".to_string(),
                ));
            }
        }
        if map.len() as u64 != task_count {
            return Err(Error::Storage(format!(
                "maintenance counter {} does not match {} stored records",
                task_count,
                map.len()
            )));
        }

        Ok(Self {
            tasks: map,
            last_task_id: task_count,
        })
    }

    /// Schedule a task and return its new id
    ///
    /// The device id is recorded as given; existence checks belong to the
    /// caller.
    ///
    /// # Errors
    /// Returns `Error::Validation` if a text field is empty.
    pub fn schedule_maintenance(
        &mut self,
        created_by: &Principal,
        input: NewMaintenanceTask,
    ) -> Result<u64> {
        input.validate()?;

        let id = self.last_task_id + 1;
        let task = MaintenanceTask {
            id,
            device_id: input.device_id,
            task_type: input.task_type,
            description: input.description,
            scheduled_date: input.scheduled_date,
            completed_date: None,
            technician: input.technician,
            status: TaskStatus::Scheduled,
            created_by: created_by.clone(),
        };

        self.tasks.insert(id, task);
        self.last_task_id = id;
        Ok(id)
    }

    /// Mark a scheduled task completed at `completed_at`
    ///
    /// # Errors
    /// Returns `Error::NotFound` for an unknown id and `Error::InvalidState`
    /// if the task is already completed or cancelled.
    pub fn complete_maintenance(&mut self, maintenance_id: u64, completed_at: i64) -> Result<bool> {
        let task = self.scheduled_task_mut(maintenance_id, TaskStatus::Completed)?;
        task.status = TaskStatus::Completed;
        task.completed_date = Some(completed_at);
        Ok(true)
    }

    /// Cancel a scheduled task
    ///
    /// # Errors
    /// Returns `Error::NotFound` for an unknown id and `Error::InvalidState`
    /// if the task is already completed or cancelled.
    pub fn cancel_maintenance(&mut self, maintenance_id: u64) -> Result<bool> {
        let task = self.scheduled_task_mut(maintenance_id, TaskStatus::Cancelled)?;
        task.status = TaskStatus::Cancelled;
        Ok(true)
    }

    /// Look up a task; `None` when the id is unknown
    pub fn get_maintenance_task(&self, maintenance_id: u64) -> Option<&MaintenanceTask> {
        self.tasks.get(&maintenance_id)
    }

    /// Number of tasks ever scheduled
    pub fn maintenance_count(&self) -> u64 {
        self.last_task_id
    }

    /// Tasks recorded against a device, in id order
    pub fn tasks_for_device(&self, device_id: u64) -> Vec<&MaintenanceTask> {
        self.tasks
            .values()
            .filter(|t| t.device_id == device_id)
            .collect()
    }

    /// Tasks currently in `status`, in id order
    pub fn tasks_with_status(&self, status: TaskStatus) -> Vec<&MaintenanceTask> {
        self.tasks.values().filter(|t| t.status == status).collect()
    }

    /// All tasks in id order
    pub fn iter(&self) -> impl Iterator<Item = &MaintenanceTask> {
        self.tasks.values()
    }

    fn scheduled_task_mut(
        &mut self,
        maintenance_id: u64,
        target: TaskStatus,
    ) -> Result<&mut MaintenanceTask> {
        let task = self
            .tasks
            .get_mut(&maintenance_id)
            .ok_or_else(|| Error::NotFound(format!("maintenance task {}", maintenance_id)))?;

        if task.status.is_terminal() {
            return Err(Error::InvalidState(format!(
                "maintenance task {} is {} and cannot become {}",
                maintenance_id, task.status, target
            )));
        }
        Ok(task)
    }
}
