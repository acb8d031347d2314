// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker repository: registration, liveness, reaping

use crate::{from_ms, json_column, json_text, to_ms, StorageError};
use chrono::{DateTime, Utc};
use fc_core::{RunId, Worker, WorkerId, WorkerStatus, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

const WORKER_COLUMNS: &str =
    "id, workspace_id, name, status, labels, last_heartbeat, current_run_id, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<Worker, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(Worker {
        id: WorkerId::from_string(row.try_get::<String, _>("id")?),
        workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
        name: row.try_get("name")?,
        status: status.parse()?,
        labels: json_column(row.try_get("labels")?)?,
        last_heartbeat: from_ms(row.try_get("last_heartbeat")?)?,
        current_run_id: row.try_get::<Option<String>, _>("current_run_id")?.map(RunId::from_string),
        created_at: from_ms(row.try_get("created_at")?)?,
        updated_at: from_ms(row.try_get("updated_at")?)?,
    })
}

pub async fn insert(pool: &SqlitePool, worker: &Worker) -> Result<(), StorageError> {
    let sql = format!("INSERT INTO workers ({WORKER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)");
    sqlx::query(&sql)
        .bind(worker.id.as_str())
        .bind(worker.workspace_id.as_str())
        .bind(&worker.name)
        .bind(worker.status.as_str())
        .bind(json_text(&worker.labels)?)
        .bind(to_ms(worker.last_heartbeat))
        .bind(worker.current_run_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(to_ms(worker.created_at))
        .bind(to_ms(worker.updated_at))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(pool: &SqlitePool, worker_id: &WorkerId) -> Result<Option<Worker>, StorageError> {
    let sql = format!("SELECT {WORKER_COLUMNS} FROM workers WHERE id = ?");
    let row = sqlx::query(&sql).bind(worker_id.as_str()).fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn get_in_workspace(
    pool: &SqlitePool,
    worker_id: &WorkerId,
    workspace_id: &WorkspaceId,
) -> Result<Option<Worker>, StorageError> {
    let sql = format!("SELECT {WORKER_COLUMNS} FROM workers WHERE id = ? AND workspace_id = ?");
    let row = sqlx::query(&sql)
        .bind(worker_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Refresh liveness. The reported status never demotes a worker that still
/// has a run attached — `busy` wins until the run detaches.
pub async fn heartbeat(
    pool: &SqlitePool,
    worker_id: &WorkerId,
    status: WorkerStatus,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let done = sqlx::query(
        "UPDATE workers SET last_heartbeat = ?, updated_at = ?, \
         status = CASE WHEN current_run_id IS NOT NULL THEN 'busy' ELSE ? END \
         WHERE id = ?",
    )
    .bind(to_ms(now))
    .bind(to_ms(now))
    .bind(status.as_str())
    .bind(worker_id.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn list(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<Vec<Worker>, StorageError> {
    let sql = format!(
        "SELECT {WORKER_COLUMNS} FROM workers WHERE workspace_id = ? ORDER BY created_at DESC"
    );
    let rows = sqlx::query(&sql).bind(workspace_id.as_str()).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Mark every worker whose heartbeat predates `cutoff` offline. Returns
/// how many were reaped. The assigned run (if any) is left alone; the run
/// timeout sweep owns it.
pub async fn reap_stale(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<u64, StorageError> {
    let done = sqlx::query(
        "UPDATE workers SET status = 'offline', updated_at = ? \
         WHERE status IN ('online', 'busy') AND last_heartbeat < ?",
    )
    .bind(to_ms(now))
    .bind(to_ms(cutoff))
    .execute(pool)
    .await?;
    Ok(done.rows_affected())
}

/// Detach a worker from its run after a terminal transition.
pub async fn free(
    pool: &SqlitePool,
    worker_id: &WorkerId,
    run_id: &RunId,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE workers SET status = 'online', current_run_id = NULL, updated_at = ? \
         WHERE id = ? AND current_run_id = ?",
    )
    .bind(to_ms(now))
    .bind(worker_id.as_str())
    .bind(run_id.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count_by_status(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<BTreeMap<String, i64>, StorageError> {
    let rows = sqlx::query(
        "SELECT status, COUNT(*) AS n FROM workers WHERE workspace_id = ? GROUP BY status",
    )
    .bind(workspace_id.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| Ok((row.try_get::<String, _>("status")?, row.try_get::<i64, _>("n")?)))
        .collect()
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
