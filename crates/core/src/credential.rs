// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-scoped encrypted credentials

use crate::{CredentialId, WorkspaceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An encrypted key/value credential, unique per `(workspace, name)`.
///
/// `encrypted_value` is an opaque sealed token; plaintext exists only
/// inside the dispatch envelope builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    /// Environment variable the plaintext is injected under at dispatch.
    pub env_var: String,
    pub encrypted_value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
