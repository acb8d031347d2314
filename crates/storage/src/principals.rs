// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tenancy repository: workspaces, users, memberships, API keys

use crate::{from_ms, to_ms, StorageError};
use chrono::{DateTime, Utc};
use fc_core::{
    ApiKey, ApiKeyId, MemberRole, User, UserId, Workspace, WorkspaceId, WorkspaceMember,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub const DEFAULT_WORKSPACE_ID: &str = "default";
pub const DEFAULT_ADMIN_USER_ID: &str = "admin";

fn workspace_from_row(row: &SqliteRow) -> Result<Workspace, StorageError> {
    Ok(Workspace {
        id: WorkspaceId::from_string(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        created_at: from_ms(row.try_get("created_at")?)?,
        updated_at: from_ms(row.try_get("updated_at")?)?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User, StorageError> {
    Ok(User {
        id: UserId::from_string(row.try_get::<String, _>("id")?),
        username: row.try_get("username")?,
        display_name: row.try_get("display_name")?,
        created_at: from_ms(row.try_get("created_at")?)?,
    })
}

/// Seed the default workspace, admin user, and owner membership. Idempotent.
pub async fn ensure_defaults(pool: &SqlitePool, now: DateTime<Utc>) -> Result<(), StorageError> {
    let now_ms = to_ms(now);
    sqlx::query(
        "INSERT OR IGNORE INTO workspaces (id, name, slug, description, created_at, updated_at) \
         VALUES (?, 'Default', 'default', 'Default workspace', ?, ?)",
    )
    .bind(DEFAULT_WORKSPACE_ID)
    .bind(now_ms)
    .bind(now_ms)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO users (id, username, display_name, created_at) \
         VALUES (?, 'admin', 'Admin', ?)",
    )
    .bind(DEFAULT_ADMIN_USER_ID)
    .bind(now_ms)
    .execute(pool)
    .await?;

    sqlx::query(
        "INSERT OR IGNORE INTO workspace_members (workspace_id, user_id, role, created_at) \
         VALUES (?, ?, 'owner', ?)",
    )
    .bind(DEFAULT_WORKSPACE_ID)
    .bind(DEFAULT_ADMIN_USER_ID)
    .bind(now_ms)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_user(pool: &SqlitePool, user_id: &UserId) -> Result<Option<User>, StorageError> {
    let row = sqlx::query("SELECT id, username, display_name, created_at FROM users WHERE id = ?")
        .bind(user_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(user_from_row).transpose()
}

pub async fn api_key_by_hash(
    pool: &SqlitePool,
    key_hash: &str,
) -> Result<Option<ApiKey>, StorageError> {
    let row = sqlx::query(
        "SELECT id, name, key_hash, role, user_id, created_at FROM api_keys WHERE key_hash = ?",
    )
    .bind(key_hash)
    .fetch_optional(pool)
    .await?;
    row.map(|row| {
        let role: String = row.try_get("role")?;
        Ok(ApiKey {
            id: ApiKeyId::from_string(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            key_hash: row.try_get("key_hash")?,
            role: role.parse()?,
            user_id: UserId::from_string(row.try_get::<String, _>("user_id")?),
            created_at: from_ms(row.try_get("created_at")?)?,
        })
    })
    .transpose()
}

pub async fn insert_api_key(pool: &SqlitePool, key: &ApiKey) -> Result<(), StorageError> {
    sqlx::query(
        "INSERT INTO api_keys (id, name, key_hash, role, user_id, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(key.id.as_str())
    .bind(&key.name)
    .bind(&key.key_hash)
    .bind(key.role.as_str())
    .bind(key.user_id.as_str())
    .bind(to_ms(key.created_at))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn membership_role(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
    user_id: &UserId,
) -> Result<Option<MemberRole>, StorageError> {
    let row = sqlx::query(
        "SELECT role FROM workspace_members WHERE workspace_id = ? AND user_id = ?",
    )
    .bind(workspace_id.as_str())
    .bind(user_id.as_str())
    .fetch_optional(pool)
    .await?;
    row.map(|row| {
        let role: String = row.try_get("role")?;
        Ok(role.parse()?)
    })
    .transpose()
}

pub async fn get_workspace(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<Option<Workspace>, StorageError> {
    let row = sqlx::query(
        "SELECT id, name, slug, description, created_at, updated_at FROM workspaces WHERE id = ?",
    )
    .bind(workspace_id.as_str())
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(workspace_from_row).transpose()
}

/// Workspaces the user belongs to.
pub async fn workspaces_for_user(
    pool: &SqlitePool,
    user_id: &UserId,
) -> Result<Vec<Workspace>, StorageError> {
    let rows = sqlx::query(
        "SELECT w.id, w.name, w.slug, w.description, w.created_at, w.updated_at \
         FROM workspaces w \
         JOIN workspace_members m ON m.workspace_id = w.id \
         WHERE m.user_id = ? ORDER BY w.name",
    )
    .bind(user_id.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter().map(workspace_from_row).collect()
}

/// Create a workspace with its creator as owner, atomically.
pub async fn create_workspace(
    pool: &SqlitePool,
    workspace: &Workspace,
    owner: &UserId,
) -> Result<(), StorageError> {
    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO workspaces (id, name, slug, description, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(workspace.id.as_str())
    .bind(&workspace.name)
    .bind(&workspace.slug)
    .bind(workspace.description.as_deref())
    .bind(to_ms(workspace.created_at))
    .bind(to_ms(workspace.updated_at))
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "INSERT INTO workspace_members (workspace_id, user_id, role, created_at) \
         VALUES (?, ?, 'owner', ?)",
    )
    .bind(workspace.id.as_str())
    .bind(owner.as_str())
    .bind(to_ms(workspace.created_at))
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(())
}

/// Members of a workspace joined with their user rows.
pub async fn members_of(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<Vec<(WorkspaceMember, User)>, StorageError> {
    let rows = sqlx::query(
        "SELECT m.workspace_id, m.user_id, m.role, m.created_at AS member_created_at, \
                u.id, u.username, u.display_name, u.created_at \
         FROM workspace_members m \
         JOIN users u ON u.id = m.user_id \
         WHERE m.workspace_id = ? ORDER BY m.created_at",
    )
    .bind(workspace_id.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| {
            let role: String = row.try_get("role")?;
            let member = WorkspaceMember {
                workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
                user_id: UserId::from_string(row.try_get::<String, _>("user_id")?),
                role: role.parse()?,
                created_at: from_ms(row.try_get("member_created_at")?)?,
            };
            Ok((member, user_from_row(row)?))
        })
        .collect()
}

#[cfg(test)]
#[path = "principals_tests.rs"]
mod tests;
