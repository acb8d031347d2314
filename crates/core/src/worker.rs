// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registration and liveness state

use crate::labels::Labels;
use crate::run::UnknownValue;
use crate::{RunId, WorkerId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Worker liveness/occupancy status.
///
/// `busy` holds exactly while `current_run_id` points at a non-terminal run
/// of this worker. `offline` is assigned by the reaper once the heartbeat
/// ages past the timeout; it never fails the assigned run by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Online,
    Busy,
    Offline,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Online => "online",
            WorkerStatus::Busy => "busy",
            WorkerStatus::Offline => "offline",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(WorkerStatus::Online),
            "busy" => Ok(WorkerStatus::Busy),
            "offline" => Ok(WorkerStatus::Offline),
            other => Err(UnknownValue::new("worker status", other)),
        }
    }
}

/// A registered worker process polling for runs in one workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub status: WorkerStatus,
    pub labels: Labels,
    pub last_heartbeat: DateTime<Utc>,
    pub current_run_id: Option<RunId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Worker {
    /// True when the heartbeat is older than the cutoff and the worker
    /// still claims to be alive.
    pub fn is_stale(&self, cutoff: DateTime<Utc>) -> bool {
        matches!(self.status, WorkerStatus::Online | WorkerStatus::Busy)
            && self.last_heartbeat < cutoff
    }
}
