// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill packages: instruction documents plus supporting files

use crate::{JsonMap, SkillId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A parsed skill package, unique per `(workspace, name)`.
///
/// `total_size_bytes` and `file_count` aggregate the attached files,
/// including the rendered `SKILL.md` itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: String,
    pub instructions: String,
    pub license: Option<String>,
    pub compatibility: Option<String>,
    pub metadata: Option<JsonMap>,
    pub allowed_tools: Option<String>,
    pub total_size_bytes: i64,
    pub file_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One file of a skill package. Bytes live in the skill store; the row
/// carries the manifest data workers verify downloads against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillFile {
    pub skill_id: SkillId,
    pub file_path: String,
    pub size_bytes: i64,
    pub checksum_sha256: String,
    pub content_type: String,
}
