// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential repository. Values stay sealed here; only the dispatch
//! envelope builder opens them.

use crate::{from_ms, to_ms, StorageError};
use fc_core::{Credential, CredentialId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const CREDENTIAL_COLUMNS: &str =
    "id, workspace_id, name, env_var, encrypted_value, description, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<Credential, StorageError> {
    Ok(Credential {
        id: CredentialId::from_string(row.try_get::<String, _>("id")?),
        workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
        name: row.try_get("name")?,
        env_var: row.try_get("env_var")?,
        encrypted_value: row.try_get("encrypted_value")?,
        description: row.try_get("description")?,
        created_at: from_ms(row.try_get("created_at")?)?,
        updated_at: from_ms(row.try_get("updated_at")?)?,
    })
}

pub async fn insert(pool: &SqlitePool, credential: &Credential) -> Result<(), StorageError> {
    let sql =
        format!("INSERT INTO credentials ({CREDENTIAL_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)");
    sqlx::query(&sql)
        .bind(credential.id.as_str())
        .bind(credential.workspace_id.as_str())
        .bind(&credential.name)
        .bind(&credential.env_var)
        .bind(&credential.encrypted_value)
        .bind(credential.description.as_deref())
        .bind(to_ms(credential.created_at))
        .bind(to_ms(credential.updated_at))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(
    pool: &SqlitePool,
    credential_id: &CredentialId,
    workspace_id: &WorkspaceId,
) -> Result<Option<Credential>, StorageError> {
    let sql =
        format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE id = ? AND workspace_id = ?");
    let row = sqlx::query(&sql)
        .bind(credential_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn list(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<Vec<Credential>, StorageError> {
    let sql =
        format!("SELECT {CREDENTIAL_COLUMNS} FROM credentials WHERE workspace_id = ? ORDER BY name");
    let rows = sqlx::query(&sql).bind(workspace_id.as_str()).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Resolve credentials by name within one workspace (envelope assembly).
/// Unknown names are simply absent from the result.
pub async fn by_names(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
    names: &[String],
) -> Result<Vec<Credential>, StorageError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "SELECT {CREDENTIAL_COLUMNS} FROM credentials \
         WHERE workspace_id = ? AND name IN ({placeholders}) ORDER BY name"
    );
    let mut query = sqlx::query(&sql).bind(workspace_id.as_str());
    for name in names {
        query = query.bind(name);
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

pub async fn update(pool: &SqlitePool, credential: &Credential) -> Result<bool, StorageError> {
    let done = sqlx::query(
        "UPDATE credentials SET name = ?, env_var = ?, encrypted_value = ?, description = ?, \
         updated_at = ? WHERE id = ? AND workspace_id = ?",
    )
    .bind(&credential.name)
    .bind(&credential.env_var)
    .bind(&credential.encrypted_value)
    .bind(credential.description.as_deref())
    .bind(to_ms(credential.updated_at))
    .bind(credential.id.as_str())
    .bind(credential.workspace_id.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn delete(
    pool: &SqlitePool,
    credential_id: &CredentialId,
    workspace_id: &WorkspaceId,
) -> Result<bool, StorageError> {
    let done = sqlx::query("DELETE FROM credentials WHERE id = ? AND workspace_id = ?")
        .bind(credential_id.as_str())
        .bind(workspace_id.as_str())
        .execute(pool)
        .await?;
    Ok(done.rows_affected() > 0)
}
