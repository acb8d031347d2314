// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact persistence: bytes in the store, manifest rows in the database

use crate::error::ApiError;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use fc_core::{ArtifactId, RunId, WorkspaceId};
use fc_storage::artifacts::{self, Artifact};
use sha2::{Digest, Sha256};

/// Persist an uploaded artifact under `{run_id}/{filename}` and record its
/// manifest. A re-upload of the same filename supersedes the old entry.
pub async fn save_artifact(
    state: &AppState,
    workspace_id: &WorkspaceId,
    run_id: &RunId,
    filename: &str,
    content_type: &str,
    data: &[u8],
    now: DateTime<Utc>,
) -> Result<Artifact, ApiError> {
    let storage_path = format!("{}/{}", run_id, filename);
    state
        .artifacts
        .save(&storage_path, data)
        .await
        .map_err(|err| ApiError::Internal(format!("write artifact: {err}")))?;

    let artifact = Artifact {
        id: ArtifactId::new(),
        workspace_id: workspace_id.clone(),
        run_id: run_id.clone(),
        filename: filename.to_string(),
        content_type: content_type.to_string(),
        size_bytes: data.len() as i64,
        checksum_sha256: format!("{:x}", Sha256::digest(data)),
        storage_path,
        created_at: now,
    };
    artifacts::upsert(state.db.pool(), &artifact).await?;
    Ok(artifact)
}

/// Raw bytes of an artifact for download.
pub async fn read_artifact_data(state: &AppState, artifact: &Artifact) -> Result<Vec<u8>, ApiError> {
    state
        .artifacts
        .read(&artifact.storage_path)
        .await
        .map_err(|err| ApiError::Internal(format!("read artifact: {err}")))
}
