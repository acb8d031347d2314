// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job definitions: reusable templates runs are snapshotted from

use crate::labels::Labels;
use crate::{JobId, JsonMap, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TIMEOUT_SECONDS: i64 = 1800;
pub const DEFAULT_RETRY_BACKOFF_SECONDS: i64 = 60;
pub const DEFAULT_AGENT_TYPE: &str = "goose";

/// Which workspace skills accompany a run's dispatch.
///
/// The wire format is a nullable list: `null` means every skill in the
/// workspace, `[]` means none, anything else names the set explicitly.
/// Internally the nullable list becomes an explicit sentinel so the
/// tri-state can't be collapsed by accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Vec<String>>", into = "Option<Vec<String>>")]
pub enum SkillSelection {
    /// Attach every skill in the run's workspace.
    All,
    /// Attach exactly the named skills; empty means none.
    Named(Vec<String>),
}

impl SkillSelection {
    pub fn none() -> Self {
        SkillSelection::Named(Vec::new())
    }
}

impl Default for SkillSelection {
    fn default() -> Self {
        SkillSelection::All
    }
}

impl From<Option<Vec<String>>> for SkillSelection {
    fn from(value: Option<Vec<String>>) -> Self {
        match value {
            None => SkillSelection::All,
            Some(names) => SkillSelection::Named(names),
        }
    }
}

impl From<SkillSelection> for Option<Vec<String>> {
    fn from(value: SkillSelection) -> Self {
        match value {
            SkillSelection::All => None,
            SkillSelection::Named(names) => Some(names),
        }
    }
}

/// A reusable agent-task template. Runs snapshot every field below at
/// trigger time; `labels` are copied into the run as `required_labels`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: JobId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub task_prompt: String,
    pub agent_type: String,
    pub agent_config: JsonMap,
    pub mcp_servers: Vec<serde_json::Value>,
    pub env_vars: BTreeMap<String, String>,
    /// Credential names resolved in the workspace at dispatch time.
    pub credential_ids: Vec<String>,
    pub labels: Labels,
    pub skill_ids: SkillSelection,
    pub timeout_seconds: i64,
    pub max_retries: u32,
    pub retry_backoff_seconds: i64,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
