// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registration, liveness, and completion messages

use fc_core::{Labels, RunId, RunStatus, WorkerId, WorkerStatus};
use serde::{Deserialize, Serialize};

/// Body of `POST /workers/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub labels: Labels,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: WorkerId,
    pub name: String,
}

/// Body of `POST /workers/heartbeat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub worker_id: WorkerId,
    #[serde(default = "default_heartbeat_status")]
    pub status: WorkerStatus,
}

fn default_heartbeat_status() -> WorkerStatus {
    WorkerStatus::Online
}

/// Heartbeat acknowledgement. `cancelled_run_id` surfaces a server-side
/// cancellation of the worker's current run so the agent can be killed
/// without waiting for the next poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_run_id: Option<RunId>,
}

/// Body of `POST /workers/runs/{run_id}/complete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRequest {
    pub status: RunStatus,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i64>,
}
