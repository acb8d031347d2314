// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact metadata repository. Bytes live in the artifact store; rows
//! carry the manifest.

use crate::{from_ms, to_ms, StorageError};
use chrono::{DateTime, Utc};
use fc_core::{ArtifactId, RunId, WorkspaceId};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Metadata of one uploaded artifact, unique per `(run, filename)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub workspace_id: WorkspaceId,
    pub run_id: RunId,
    pub filename: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub checksum_sha256: String,
    pub storage_path: String,
    pub created_at: DateTime<Utc>,
}

const ARTIFACT_COLUMNS: &str = "id, workspace_id, run_id, filename, content_type, size_bytes, \
     checksum_sha256, storage_path, created_at";

fn from_row(row: &SqliteRow) -> Result<Artifact, StorageError> {
    Ok(Artifact {
        id: ArtifactId::from_string(row.try_get::<String, _>("id")?),
        workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
        run_id: RunId::from_string(row.try_get::<String, _>("run_id")?),
        filename: row.try_get("filename")?,
        content_type: row.try_get("content_type")?,
        size_bytes: row.try_get("size_bytes")?,
        checksum_sha256: row.try_get("checksum_sha256")?,
        storage_path: row.try_get("storage_path")?,
        created_at: from_ms(row.try_get("created_at")?)?,
    })
}

/// Insert or replace on `(run_id, filename)` so a re-uploaded file
/// supersedes its predecessor.
pub async fn upsert(pool: &SqlitePool, artifact: &Artifact) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT OR REPLACE INTO artifacts ({ARTIFACT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(artifact.id.as_str())
        .bind(artifact.workspace_id.as_str())
        .bind(artifact.run_id.as_str())
        .bind(&artifact.filename)
        .bind(&artifact.content_type)
        .bind(artifact.size_bytes)
        .bind(&artifact.checksum_sha256)
        .bind(&artifact.storage_path)
        .bind(to_ms(artifact.created_at))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_by_run(
    pool: &SqlitePool,
    run_id: &RunId,
) -> Result<Vec<Artifact>, StorageError> {
    let sql = format!(
        "SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE run_id = ? ORDER BY created_at ASC, id ASC"
    );
    let rows = sqlx::query(&sql).bind(run_id.as_str()).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

pub async fn get(
    pool: &SqlitePool,
    artifact_id: &ArtifactId,
    workspace_id: &WorkspaceId,
) -> Result<Option<Artifact>, StorageError> {
    let sql = format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE id = ? AND workspace_id = ?");
    let row = sqlx::query(&sql)
        .bind(artifact_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn get_by_filename(
    pool: &SqlitePool,
    run_id: &RunId,
    filename: &str,
) -> Result<Option<Artifact>, StorageError> {
    let sql = format!("SELECT {ARTIFACT_COLUMNS} FROM artifacts WHERE run_id = ? AND filename = ?");
    let row =
        sqlx::query(&sql).bind(run_id.as_str()).bind(filename).fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}
