// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run repository: FIFO candidate scan, the conditional-update claim,
//! and terminal transitions

use crate::{from_ms, from_opt_ms, json_column, json_text, to_ms, to_opt_ms, StorageError};
use chrono::{DateTime, Utc};
use fc_core::{JobId, JobRun, RunId, RunStatus, WorkerId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;

const RUN_COLUMNS: &str = "id, workspace_id, job_definition_id, status, worker_id, name, \
     task_prompt, agent_type, agent_config, mcp_servers, env_vars, credential_ids, \
     required_labels, skill_ids, timeout_seconds, max_retries, retry_backoff_seconds, \
     attempt_number, parent_run_id, webhook_url, webhook_secret, scheduled_at, started_at, \
     completed_at, result, exit_code, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<JobRun, StorageError> {
    let status: String = row.try_get("status")?;
    Ok(JobRun {
        id: RunId::from_string(row.try_get::<String, _>("id")?),
        workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
        job_definition_id: row
            .try_get::<Option<String>, _>("job_definition_id")?
            .map(JobId::from_string),
        status: status.parse()?,
        worker_id: row.try_get::<Option<String>, _>("worker_id")?.map(WorkerId::from_string),
        name: row.try_get("name")?,
        task_prompt: row.try_get("task_prompt")?,
        agent_type: row.try_get("agent_type")?,
        agent_config: json_column(row.try_get("agent_config")?)?,
        mcp_servers: json_column(row.try_get("mcp_servers")?)?,
        env_vars: json_column(row.try_get("env_vars")?)?,
        credential_ids: json_column(row.try_get("credential_ids")?)?,
        required_labels: json_column(row.try_get("required_labels")?)?,
        skill_ids: row
            .try_get::<Option<String>, _>("skill_ids")?
            .map(|text| serde_json::from_str::<Vec<String>>(&text))
            .transpose()?
            .into(),
        timeout_seconds: row.try_get("timeout_seconds")?,
        max_retries: row.try_get::<i64, _>("max_retries")? as u32,
        retry_backoff_seconds: row.try_get("retry_backoff_seconds")?,
        attempt_number: row.try_get::<i64, _>("attempt_number")? as u32,
        parent_run_id: row.try_get::<Option<String>, _>("parent_run_id")?.map(RunId::from_string),
        webhook_url: row.try_get("webhook_url")?,
        webhook_secret: row.try_get("webhook_secret")?,
        scheduled_at: from_opt_ms(row.try_get("scheduled_at")?)?,
        started_at: from_opt_ms(row.try_get("started_at")?)?,
        completed_at: from_opt_ms(row.try_get("completed_at")?)?,
        result: row.try_get("result")?,
        exit_code: row.try_get("exit_code")?,
        created_at: from_ms(row.try_get("created_at")?)?,
        updated_at: from_ms(row.try_get("updated_at")?)?,
    })
}

fn skill_ids_text(run: &JobRun) -> Result<Option<String>, StorageError> {
    let names: Option<Vec<String>> = run.skill_ids.clone().into();
    names.map(|n| json_text(&n)).transpose()
}

pub async fn insert(pool: &SqlitePool, run: &JobRun) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT INTO job_runs ({RUN_COLUMNS}) VALUES \
         (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(run.id.as_str())
        .bind(run.workspace_id.as_str())
        .bind(run.job_definition_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(run.status.as_str())
        .bind(run.worker_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(&run.name)
        .bind(&run.task_prompt)
        .bind(&run.agent_type)
        .bind(json_text(&run.agent_config)?)
        .bind(json_text(&run.mcp_servers)?)
        .bind(json_text(&run.env_vars)?)
        .bind(json_text(&run.credential_ids)?)
        .bind(json_text(&run.required_labels)?)
        .bind(skill_ids_text(run)?)
        .bind(run.timeout_seconds)
        .bind(run.max_retries as i64)
        .bind(run.retry_backoff_seconds)
        .bind(run.attempt_number as i64)
        .bind(run.parent_run_id.as_ref().map(|id| id.as_str().to_string()))
        .bind(run.webhook_url.as_deref())
        .bind(run.webhook_secret.as_deref())
        .bind(to_opt_ms(run.scheduled_at))
        .bind(to_opt_ms(run.started_at))
        .bind(to_opt_ms(run.completed_at))
        .bind(run.result.as_deref())
        .bind(run.exit_code)
        .bind(to_ms(run.created_at))
        .bind(to_ms(run.updated_at))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(pool: &SqlitePool, run_id: &RunId) -> Result<Option<JobRun>, StorageError> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM job_runs WHERE id = ?");
    let row = sqlx::query(&sql).bind(run_id.as_str()).fetch_optional(pool).await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn get_in_workspace(
    pool: &SqlitePool,
    run_id: &RunId,
    workspace_id: &WorkspaceId,
) -> Result<Option<JobRun>, StorageError> {
    let sql = format!("SELECT {RUN_COLUMNS} FROM job_runs WHERE id = ? AND workspace_id = ?");
    let row = sqlx::query(&sql)
        .bind(run_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

/// Newest-first listing for the runs API, optionally filtered by
/// definition and status.
pub async fn list(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
    job_id: Option<&JobId>,
    status: Option<RunStatus>,
) -> Result<Vec<JobRun>, StorageError> {
    let mut sql = format!("SELECT {RUN_COLUMNS} FROM job_runs WHERE workspace_id = ?");
    if job_id.is_some() {
        sql.push_str(" AND job_definition_id = ?");
    }
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    sql.push_str(" ORDER BY created_at DESC, id DESC");

    let mut query = sqlx::query(&sql).bind(workspace_id.as_str());
    if let Some(job_id) = job_id {
        query = query.bind(job_id.as_str());
    }
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    let rows = query.fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Dispatch candidates for a workspace: queued, past any activation gate,
/// oldest first with ties broken by id. Label matching happens in the
/// dispatcher, so this is a superset of what a given worker may claim.
pub async fn queued_candidates(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
    now: DateTime<Utc>,
) -> Result<Vec<JobRun>, StorageError> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM job_runs \
         WHERE workspace_id = ? AND status = 'queued' \
           AND (scheduled_at IS NULL OR scheduled_at <= ?) \
         ORDER BY created_at ASC, id ASC"
    );
    let rows = sqlx::query(&sql)
        .bind(workspace_id.as_str())
        .bind(to_ms(now))
        .fetch_all(pool)
        .await?;
    rows.iter().map(from_row).collect()
}

/// Atomically claim a queued run for a worker.
///
/// The `status = 'queued'` guard is what makes concurrent polls safe: the
/// first transaction to commit wins, every other one sees zero rows and
/// rolls back. The worker flip to busy rides the same transaction.
pub async fn claim(
    pool: &SqlitePool,
    run_id: &RunId,
    worker_id: &WorkerId,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let now_ms = to_ms(now);
    let mut tx = pool.begin().await?;

    let claimed = sqlx::query(
        "UPDATE job_runs SET status = 'assigned', worker_id = ?, started_at = ?, updated_at = ? \
         WHERE id = ? AND status = 'queued'",
    )
    .bind(worker_id.as_str())
    .bind(now_ms)
    .bind(now_ms)
    .bind(run_id.as_str())
    .execute(&mut *tx)
    .await?;

    if claimed.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        "UPDATE workers SET status = 'busy', current_run_id = ?, updated_at = ? WHERE id = ?",
    )
    .bind(run_id.as_str())
    .bind(now_ms)
    .bind(worker_id.as_str())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// Advance `assigned → running` once logs start arriving. A no-op in any
/// other state.
pub async fn mark_running(
    pool: &SqlitePool,
    run_id: &RunId,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    sqlx::query("UPDATE job_runs SET status = 'running', updated_at = ? WHERE id = ? AND status = 'assigned'")
        .bind(to_ms(now))
        .bind(run_id.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Apply a terminal status to an in-flight run. Guarded so terminal states
/// stay absorbing; returns whether this call performed the transition.
pub async fn finish(
    pool: &SqlitePool,
    run_id: &RunId,
    status: RunStatus,
    result: Option<&str>,
    exit_code: Option<i64>,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    debug_assert!(status.is_terminal());
    let done = sqlx::query(
        "UPDATE job_runs SET status = ?, result = ?, exit_code = ?, completed_at = ?, updated_at = ? \
         WHERE id = ? AND status IN ('assigned', 'running')",
    )
    .bind(status.as_str())
    .bind(result)
    .bind(exit_code)
    .bind(to_ms(now))
    .bind(to_ms(now))
    .bind(run_id.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected() > 0)
}

/// Cancel a run still in `{queued, assigned, running}`. Returns whether
/// the transition happened.
pub async fn cancel(
    pool: &SqlitePool,
    run_id: &RunId,
    workspace_id: &WorkspaceId,
    now: DateTime<Utc>,
) -> Result<bool, StorageError> {
    let done = sqlx::query(
        "UPDATE job_runs SET status = 'cancelled', completed_at = ?, updated_at = ? \
         WHERE id = ? AND workspace_id = ? AND status IN ('queued', 'assigned', 'running')",
    )
    .bind(to_ms(now))
    .bind(to_ms(now))
    .bind(run_id.as_str())
    .bind(workspace_id.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected() > 0)
}

/// In-flight runs whose snapshotted timeout has elapsed.
pub async fn timed_out(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<Vec<JobRun>, StorageError> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM job_runs \
         WHERE status IN ('assigned', 'running') AND started_at IS NOT NULL \
           AND started_at + timeout_seconds * 1000 <= ?"
    );
    let rows = sqlx::query(&sql).bind(to_ms(now)).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

pub async fn count_by_status(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<BTreeMap<String, i64>, StorageError> {
    let rows = sqlx::query(
        "SELECT status, COUNT(*) AS n FROM job_runs WHERE workspace_id = ? GROUP BY status",
    )
    .bind(workspace_id.as_str())
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| Ok((row.try_get::<String, _>("status")?, row.try_get::<i64, _>("n")?)))
        .collect()
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
