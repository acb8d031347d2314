// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule repository

use crate::{from_ms, from_opt_ms, to_ms, to_opt_ms, StorageError};
use chrono::{DateTime, Utc};
use fc_core::{JobId, RunId, Schedule, ScheduleId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const SCHEDULE_COLUMNS: &str = "id, workspace_id, job_definition_id, cron_expression, enabled, \
     name, next_run_at, last_run_at, last_run_id, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<Schedule, StorageError> {
    Ok(Schedule {
        id: ScheduleId::from_string(row.try_get::<String, _>("id")?),
        workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
        job_definition_id: JobId::from_string(row.try_get::<String, _>("job_definition_id")?),
        cron_expression: row.try_get("cron_expression")?,
        enabled: row.try_get("enabled")?,
        name: row.try_get("name")?,
        next_run_at: from_opt_ms(row.try_get("next_run_at")?)?,
        last_run_at: from_opt_ms(row.try_get("last_run_at")?)?,
        last_run_id: row.try_get::<Option<String>, _>("last_run_id")?.map(RunId::from_string),
        created_at: from_ms(row.try_get("created_at")?)?,
        updated_at: from_ms(row.try_get("updated_at")?)?,
    })
}

pub async fn insert(pool: &SqlitePool, schedule: &Schedule) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT INTO schedules ({SCHEDULE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(schedule.id.as_str())
        .bind(schedule.workspace_id.as_str())
        .bind(schedule.job_definition_id.as_str())
        .bind(&schedule.cron_expression)
        .bind(schedule.enabled)
        .bind(schedule.name.as_deref())
        .bind(to_opt_ms(schedule.next_run_at))
        .bind(to_opt_ms(schedule.last_run_at))
        .bind(schedule.last_run_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(to_ms(schedule.created_at))
        .bind(to_ms(schedule.updated_at))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(
    pool: &SqlitePool,
    schedule_id: &ScheduleId,
    workspace_id: &WorkspaceId,
) -> Result<Option<Schedule>, StorageError> {
    let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ? AND workspace_id = ?");
    let row = sqlx::query(&sql)
        .bind(schedule_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn list(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<Vec<Schedule>, StorageError> {
    let sql = format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE workspace_id = ? \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query(&sql).bind(workspace_id.as_str()).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Every enabled schedule, workspace-agnostic (startup recompute).
pub async fn list_enabled(pool: &SqlitePool) -> Result<Vec<Schedule>, StorageError> {
    let sql = format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE enabled = 1");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Enabled schedules whose `next_run_at` has elapsed, workspace-agnostic.
pub async fn due(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Vec<Schedule>, StorageError> {
    let sql = format!(
        "SELECT {SCHEDULE_COLUMNS} FROM schedules \
         WHERE enabled = 1 AND next_run_at IS NOT NULL AND next_run_at <= ?"
    );
    let rows = sqlx::query(&sql).bind(to_ms(now)).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

pub async fn update(pool: &SqlitePool, schedule: &Schedule) -> Result<bool, StorageError> {
    let done = sqlx::query(
        "UPDATE schedules SET job_definition_id = ?, cron_expression = ?, enabled = ?, name = ?, \
         next_run_at = ?, updated_at = ? WHERE id = ? AND workspace_id = ?",
    )
    .bind(schedule.job_definition_id.as_str())
    .bind(&schedule.cron_expression)
    .bind(schedule.enabled)
    .bind(schedule.name.as_deref())
    .bind(to_opt_ms(schedule.next_run_at))
    .bind(to_ms(schedule.updated_at))
    .bind(schedule.id.as_str())
    .bind(schedule.workspace_id.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected() > 0)
}

/// Record a successful fire: bookkeeping plus the post-advance gate.
pub async fn mark_fired(
    pool: &SqlitePool,
    schedule_id: &ScheduleId,
    fired_at: DateTime<Utc>,
    run_id: &RunId,
    next_run_at: Option<DateTime<Utc>>,
) -> Result<(), StorageError> {
    sqlx::query(
        "UPDATE schedules SET last_run_at = ?, last_run_id = ?, next_run_at = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(to_ms(fired_at))
    .bind(run_id.as_str())
    .bind(to_opt_ms(next_run_at))
    .bind(to_ms(fired_at))
    .bind(schedule_id.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Advance the gate without firing bookkeeping (failed trigger, startup
/// recompute).
pub async fn set_next_run_at(
    pool: &SqlitePool,
    schedule_id: &ScheduleId,
    next_run_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE schedules SET next_run_at = ?, updated_at = ? WHERE id = ?")
        .bind(to_opt_ms(next_run_at))
        .bind(to_ms(now))
        .bind(schedule_id.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(
    pool: &SqlitePool,
    schedule_id: &ScheduleId,
    workspace_id: &WorkspaceId,
) -> Result<bool, StorageError> {
    let done = sqlx::query("DELETE FROM schedules WHERE id = ? AND workspace_id = ?")
        .bind(schedule_id.as_str())
        .bind(workspace_id.as_str())
        .execute(pool)
        .await?;
    Ok(done.rows_affected() > 0)
}
