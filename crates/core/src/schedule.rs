// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron schedules driving periodic run creation

use crate::{JobId, RunId, ScheduleId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cron expression paired with a job definition.
///
/// `next_run_at` is the sole firing gate: the scheduler advances it past
/// `now` on every tick that observes it due, whether or not triggering
/// succeeded, so a broken job can never produce a tight retry loop.
/// Disabled schedules carry no `next_run_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub workspace_id: WorkspaceId,
    pub job_definition_id: JobId,
    pub cron_expression: String,
    pub enabled: bool,
    pub name: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run_id: Option<RunId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run_at.is_some_and(|at| at <= now)
    }
}
