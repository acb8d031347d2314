// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch envelope: the poll response that carries a claimed run

use fc_core::{JsonMap, RunId, SkillId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest entry for one skill file. Bytes are never embedded — workers
/// fetch them over `GET /skills/{id}/files/{path}` and verify the checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillFileRef {
    pub file_path: String,
    pub size_bytes: i64,
    pub checksum_sha256: String,
    pub content_type: String,
}

/// A skill attached to a dispatched run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillManifest {
    pub id: SkillId,
    pub name: String,
    pub instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<String>,
    pub files: Vec<SkillFileRef>,
}

/// Everything a worker needs to execute a claimed run.
///
/// `credentials` maps env var names to decrypted plaintext; it exists only
/// on this wire type and is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchEnvelope {
    pub run_id: RunId,
    pub name: String,
    pub task_prompt: String,
    pub agent_type: String,
    #[serde(default)]
    pub agent_config: JsonMap,
    #[serde(default)]
    pub mcp_servers: Vec<serde_json::Value>,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    #[serde(default)]
    pub skills: Vec<SkillManifest>,
    pub timeout_seconds: i64,
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
