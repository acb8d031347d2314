// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job definition repository

use crate::{from_ms, json_column, json_text, to_ms, StorageError};
use fc_core::{JobDefinition, JobId, WorkspaceId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const JOB_COLUMNS: &str = "id, workspace_id, name, description, task_prompt, agent_type, \
     agent_config, mcp_servers, env_vars, credential_ids, labels, skill_ids, timeout_seconds, \
     max_retries, retry_backoff_seconds, webhook_url, webhook_secret, created_at, updated_at";

fn from_row(row: &SqliteRow) -> Result<JobDefinition, StorageError> {
    Ok(JobDefinition {
        id: JobId::from_string(row.try_get::<String, _>("id")?),
        workspace_id: WorkspaceId::from_string(row.try_get::<String, _>("workspace_id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        task_prompt: row.try_get("task_prompt")?,
        agent_type: row.try_get("agent_type")?,
        agent_config: json_column(row.try_get("agent_config")?)?,
        mcp_servers: json_column(row.try_get("mcp_servers")?)?,
        env_vars: json_column(row.try_get("env_vars")?)?,
        credential_ids: json_column(row.try_get("credential_ids")?)?,
        labels: json_column(row.try_get("labels")?)?,
        skill_ids: row
            .try_get::<Option<String>, _>("skill_ids")?
            .map(|text| serde_json::from_str::<Vec<String>>(&text))
            .transpose()?
            .into(),
        timeout_seconds: row.try_get("timeout_seconds")?,
        max_retries: row.try_get::<i64, _>("max_retries")? as u32,
        retry_backoff_seconds: row.try_get("retry_backoff_seconds")?,
        webhook_url: row.try_get("webhook_url")?,
        webhook_secret: row.try_get("webhook_secret")?,
        created_at: from_ms(row.try_get("created_at")?)?,
        updated_at: from_ms(row.try_get("updated_at")?)?,
    })
}

fn skill_ids_text(job: &JobDefinition) -> Result<Option<String>, StorageError> {
    let names: Option<Vec<String>> = job.skill_ids.clone().into();
    names.map(|n| json_text(&n)).transpose()
}

pub async fn insert(pool: &SqlitePool, job: &JobDefinition) -> Result<(), StorageError> {
    let sql = format!(
        "INSERT INTO job_definitions ({JOB_COLUMNS}) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );
    sqlx::query(&sql)
        .bind(job.id.as_str())
        .bind(job.workspace_id.as_str())
        .bind(&job.name)
        .bind(job.description.as_deref())
        .bind(&job.task_prompt)
        .bind(&job.agent_type)
        .bind(json_text(&job.agent_config)?)
        .bind(json_text(&job.mcp_servers)?)
        .bind(json_text(&job.env_vars)?)
        .bind(json_text(&job.credential_ids)?)
        .bind(json_text(&job.labels)?)
        .bind(skill_ids_text(job)?)
        .bind(job.timeout_seconds)
        .bind(job.max_retries as i64)
        .bind(job.retry_backoff_seconds)
        .bind(job.webhook_url.as_deref())
        .bind(job.webhook_secret.as_deref())
        .bind(to_ms(job.created_at))
        .bind(to_ms(job.updated_at))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get(
    pool: &SqlitePool,
    job_id: &JobId,
    workspace_id: &WorkspaceId,
) -> Result<Option<JobDefinition>, StorageError> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM job_definitions WHERE id = ? AND workspace_id = ?");
    let row = sqlx::query(&sql)
        .bind(job_id.as_str())
        .bind(workspace_id.as_str())
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(from_row).transpose()
}

pub async fn list(
    pool: &SqlitePool,
    workspace_id: &WorkspaceId,
) -> Result<Vec<JobDefinition>, StorageError> {
    let sql = format!(
        "SELECT {JOB_COLUMNS} FROM job_definitions WHERE workspace_id = ? \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query(&sql).bind(workspace_id.as_str()).fetch_all(pool).await?;
    rows.iter().map(from_row).collect()
}

/// Full-row update; the API layer merges partial updates before calling.
pub async fn update(pool: &SqlitePool, job: &JobDefinition) -> Result<bool, StorageError> {
    let done = sqlx::query(
        "UPDATE job_definitions SET name = ?, description = ?, task_prompt = ?, agent_type = ?, \
         agent_config = ?, mcp_servers = ?, env_vars = ?, credential_ids = ?, labels = ?, \
         skill_ids = ?, timeout_seconds = ?, max_retries = ?, retry_backoff_seconds = ?, \
         webhook_url = ?, webhook_secret = ?, updated_at = ? \
         WHERE id = ? AND workspace_id = ?",
    )
    .bind(&job.name)
    .bind(job.description.as_deref())
    .bind(&job.task_prompt)
    .bind(&job.agent_type)
    .bind(json_text(&job.agent_config)?)
    .bind(json_text(&job.mcp_servers)?)
    .bind(json_text(&job.env_vars)?)
    .bind(json_text(&job.credential_ids)?)
    .bind(json_text(&job.labels)?)
    .bind(skill_ids_text(job)?)
    .bind(job.timeout_seconds)
    .bind(job.max_retries as i64)
    .bind(job.retry_backoff_seconds)
    .bind(job.webhook_url.as_deref())
    .bind(job.webhook_secret.as_deref())
    .bind(to_ms(job.updated_at))
    .bind(job.id.as_str())
    .bind(job.workspace_id.as_str())
    .execute(pool)
    .await?;
    Ok(done.rows_affected() > 0)
}

pub async fn delete(
    pool: &SqlitePool,
    job_id: &JobId,
    workspace_id: &WorkspaceId,
) -> Result<bool, StorageError> {
    let done = sqlx::query("DELETE FROM job_definitions WHERE id = ? AND workspace_id = ?")
        .bind(job_id.as_str())
        .bind(workspace_id.as_str())
        .execute(pool)
        .await?;
    Ok(done.rows_affected() > 0)
}
