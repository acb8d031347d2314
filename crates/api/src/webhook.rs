// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook notification payload for terminal run transitions

use chrono::{DateTime, Utc};
use fc_core::{JobId, JobRun, RunId, RunStatus};
use serde::{Deserialize, Serialize};

/// JSON body POSTed to a run's `webhook_url` when it reaches a terminal
/// status. When a secret is configured the body is signed with
/// `X-FlightControl-Signature: sha256=<hex HMAC-SHA256>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub run_id: RunId,
    pub job_id: Option<JobId>,
    pub status: RunStatus,
    pub exit_code: Option<i64>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
}

impl WebhookPayload {
    pub fn from_run(run: &JobRun) -> Self {
        Self {
            run_id: run.id.clone(),
            job_id: run.job_definition_id.clone(),
            status: run.status,
            exit_code: run.exit_code,
            started_at: run.started_at,
            completed_at: run.completed_at,
            duration_seconds: run.duration_seconds(),
        }
    }
}
