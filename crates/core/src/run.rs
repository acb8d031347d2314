// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job runs: the dispatch state machine's subject

use crate::job::{JobDefinition, SkillSelection};
use crate::labels::Labels;
use crate::{JobId, JsonMap, RunId, WorkerId, WorkspaceId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Error for string-to-enum conversions from persisted or wire values.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

/// Run lifecycle status.
///
/// `queued → assigned → running` forward, then exactly one terminal state.
/// Terminal states are absorbing: retries spawn a new run instead of
/// reviving a finished one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Assigned,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::Assigned => "assigned",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Timeout => "timeout",
            RunStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Timeout | RunStatus::Cancelled
        )
    }

    /// States a run may be cancelled from.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::Assigned | RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(RunStatus::Queued),
            "assigned" => Ok(RunStatus::Assigned),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            "timeout" => Ok(RunStatus::Timeout),
            "cancelled" => Ok(RunStatus::Cancelled),
            other => Err(UnknownValue::new("run status", other)),
        }
    }
}

/// Output stream a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl LogStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStream::Stdout => "stdout",
            LogStream::Stderr => "stderr",
        }
    }
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStream {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogStream::Stdout),
            "stderr" => Ok(LogStream::Stderr),
            other => Err(UnknownValue::new("log stream", other)),
        }
    }
}

/// One persisted log line of a run.
///
/// `sequence` starts at 1 and strictly increases per run as produced by a
/// single worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLog {
    pub run_id: RunId,
    pub sequence: i64,
    pub stream: LogStream,
    pub line: String,
}

/// A single invocation of an agent task, snapshotted from its job
/// definition (or supplied directly for ad-hoc runs) at trigger time.
///
/// Later edits to the definition never retarget an existing run; in
/// particular `required_labels` keeps the routing requirements it was
/// created with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRun {
    pub id: RunId,
    pub workspace_id: WorkspaceId,
    /// `None` for ad-hoc runs created without a definition.
    pub job_definition_id: Option<JobId>,
    pub status: RunStatus,
    pub worker_id: Option<WorkerId>,

    pub name: String,
    pub task_prompt: String,
    pub agent_type: String,
    pub agent_config: JsonMap,
    pub mcp_servers: Vec<serde_json::Value>,
    pub env_vars: BTreeMap<String, String>,
    /// Credential *names* to resolve in the run's workspace at dispatch.
    pub credential_ids: Vec<String>,
    pub required_labels: Labels,
    pub skill_ids: SkillSelection,
    pub timeout_seconds: i64,

    pub max_retries: u32,
    pub retry_backoff_seconds: i64,
    pub attempt_number: u32,
    /// Links retries into a chain; the root has `attempt_number = 1`.
    pub parent_run_id: Option<RunId>,

    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,

    /// Future activation gate; `None` dispatches immediately.
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub exit_code: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRun {
    /// Snapshot a fresh queued run from a job definition.
    pub fn from_definition(job: &JobDefinition, now: DateTime<Utc>) -> Self {
        Self {
            id: RunId::new(),
            workspace_id: job.workspace_id.clone(),
            job_definition_id: Some(job.id.clone()),
            status: RunStatus::Queued,
            worker_id: None,
            name: job.name.clone(),
            task_prompt: job.task_prompt.clone(),
            agent_type: job.agent_type.clone(),
            agent_config: job.agent_config.clone(),
            mcp_servers: job.mcp_servers.clone(),
            env_vars: job.env_vars.clone(),
            credential_ids: job.credential_ids.clone(),
            // Job labels become the run's routing requirements.
            required_labels: job.labels.clone(),
            skill_ids: job.skill_ids.clone(),
            timeout_seconds: job.timeout_seconds,
            max_retries: job.max_retries,
            retry_backoff_seconds: job.retry_backoff_seconds,
            attempt_number: 1,
            parent_run_id: None,
            webhook_url: job.webhook_url.clone(),
            webhook_secret: job.webhook_secret.clone(),
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            result: None,
            exit_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a failed or timed-out attempt may still spawn a retry.
    pub fn retry_eligible(&self) -> bool {
        self.attempt_number <= self.max_retries
    }

    /// Build the retry child for this attempt: same snapshot, next attempt
    /// number, activation deferred by the configured backoff.
    ///
    /// Returns `None` once the retry budget is spent.
    pub fn retry_child(&self, now: DateTime<Utc>) -> Option<JobRun> {
        if !self.retry_eligible() {
            return None;
        }
        let mut child = self.clone();
        child.id = RunId::new();
        child.status = RunStatus::Queued;
        child.worker_id = None;
        child.attempt_number = self.attempt_number + 1;
        child.parent_run_id = Some(self.id.clone());
        child.scheduled_at = Some(now + Duration::seconds(self.retry_backoff_seconds));
        child.started_at = None;
        child.completed_at = None;
        child.result = None;
        child.exit_code = None;
        child.created_at = now;
        child.updated_at = now;
        Some(child)
    }

    /// Seconds between start and completion, when both are known.
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
