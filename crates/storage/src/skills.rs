// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill and skill-file repository

use crate::{from_ms, json_column, json_text, to_ms, StorageError};
use fc_core::{JsonMap, Skill, SkillFile, SkillId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SKILL_COLUMNS: &str = "id, workspace_id, name, description, instructions, license, \
     compatibility, metadata, allowed_tools, total_size_bytes, file_count, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<Skill, StorageError> {
    let metadata: Option<JsonMap> = row
        .try_get::<Option<String>, _>("metadata")?
        .map(|text| serde_json::from_str(&text))
        .transpose()?;
    Ok(Skill {
        id: SkillId::from_string(row.try_get::<String, _>("id")?),
        workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        instructions: row.try_get("instructions")?,
        license: row.try_get("license")?,
        compatibility: row.try_get("compatibility")?,
        metadata,
        allowed_tools: row.try_get("allowed_tools")?,
        total_size_bytes: row.try_get("total_size_bytes")?,
        file_count: row.try_get("file_count")?,
        created_at: from_ms(row.try_get("created_at")?)?,
        updated_at: from_ms(row.try_get("updated_at")?)?,
    })
}

fn file_from_row(row: &SqliteRow) -> Result<SkillFile, StorageError> {
    Ok(SkillFile {
        skill_id: SkillId::from_string(row.try_get::<String, _>("skill_id")?),
        file_path: row.try_get("file_path")?,
        size_bytes: row.try_get("size_bytes")?,
        checksum_sha256: row.try_get("checksum_sha256")?,
        content_type: row.try_get("content_type")?,
    })
}

/// Insert a skill and its file manifest in one transaction.
pub async fn insert_with_files(
    pool: &SqlitePool,
    skill: &Skill,
    files: &[SkillFile],
) -> Result<(), StorageError> {
    let mut tx = pool.begin().await?;
    let sql = format!(
        "INSERT INTO skills ({SKILL_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(skill.id.as_str())
        .bind(skill.workspace_id.as_str())
        .bind(&skill.name)
        .bind(&skill.description)
        .bind(&skill.instructions)
        .bind(skill.license.as_deref())
        .bind(skill.compatibility.as_deref())
        .bind(skill.metadata.as_ref().map(json_text).transpose()?)
        .bind(skill.allowed_tools.as_deref())
        .bind(skill.total_size_bytes)
        .bind(skill.file_count)
        .bind(to_ms(skill.created_at))
        .bind(to_ms(skill.updated_at))
        .execute(&mut *tx)
        .await?;

    for file in files {
        sqlx::query(
            "INSERT INTO skill_files (skill_id, file_path, size_bytes, checksum_sha256, content_type) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(file.skill_id.as_str())
        .bind(&file.file_path)
        .bind(file.size_bytes)
        .bind(&file.checksum_sha256)
        .bind(&file.content_type)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn get(
    pool: &SqlitePool,
    skill_id: &SkillId,
    workspace_id: &WorkspaceId,
) -> Result<Option<Skill>, StorageError> {
    let sql = format!("SELECT {SKILL_COLUMNS} FROM skills WHERE id = ? AND workspace_id = ?");
    let row = sqlx::query(&sql)
        .bind(skill_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn get_by_name(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
    name: &str,
) -> Result<Option<Skill>, StorageError> {
    let sql = format!("SELECT {SKILL_COLUMNS} FROM skills WHERE workspace_id = ? AND name = ?");
    let row =
        sqlx::query(&sql).bind(workspace_id.as_str()).bind(name).fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn list(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<Vec<Skill>, StorageError> {
    let sql = format!("SELECT {SKILL_COLUMNS} FROM skills WHERE workspace_id = ? ORDER BY name");
    let rows = sqlx::query(&sql).bind(workspace_id.as_str()).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Resolve a set of skill names to rows; unknown names are absent.
pub async fn by_names(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
    names: &[String],
) -> Result<Vec<Skill>, StorageError> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "SELECT {SKILL_COLUMNS} FROM skills \
         WHERE workspace_id = ? AND name IN ({placeholders}) ORDER BY name"
    );
    let mut query = sqlx::query(&sql).bind(workspace_id.as_str());
    for name in names {
        query = query.bind(name);
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

pub async fn files_of(pool: &SqlitePool, skill_id: &SkillId) -> Result<Vec<SkillFile>, StorageError> {
    let rows = sqlx::query(
        "SELECT skill_id, file_path, size_bytes, checksum_sha256, content_type \
         FROM skill_files WHERE skill_id = ? ORDER BY file_path",
    )
    .bind(skill_id.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter().map(file_from_row).collect()
}

/// Update the editable metadata fields of a skill.
pub async fn update_meta(pool: &SqlitePool, skill: &Skill) -> Result<bool, StorageError> {
    let done = sqlx::query(
        "UPDATE skills SET description = ?, instructions = ?, license = ?, compatibility = ?, \
         metadata = ?, allowed_tools = ?, updated_at = ? WHERE id = ? AND workspace_id = ?",
    )
    .bind(&skill.description)
    .bind(&skill.instructions)
    .bind(skill.license.as_deref())
    .bind(skill.compatibility.as_deref())
    .bind(skill.metadata.as_ref().map(json_text).transpose()?)
    .bind(skill.allowed_tools.as_deref())
    .bind(to_ms(skill.updated_at))
    .bind(skill.id.as_str())
    .bind(skill.workspace_id.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn delete(
    pool: &SqlitePool,
    skill_id: &SkillId,
    workspace_id: &WorkspaceId,
) -> Result<bool, StorageError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM skill_files WHERE skill_id = ?")
        .bind(skill_id.as_str())
        .execute(&mut *tx)
        .await?;
    let done = sqlx::query("DELETE FROM skills WHERE id = ? AND workspace_id = ?")
        .bind(skill_id.as_str())
        .bind(workspace_id.as_str())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(done.rows_affected() > 0)
}
