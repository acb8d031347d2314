// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job definition CRUD and explicit triggering

use crate::api::runs::RunResponse;
use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::lifecycle;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fc_core::job::{DEFAULT_AGENT_TYPE, DEFAULT_RETRY_BACKOFF_SECONDS, DEFAULT_TIMEOUT_SECONDS};
use fc_core::{JobDefinition, JobId, JsonMap, Labels, SkillSelection, WorkspaceId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/:id", get(get_job).put(update_job).delete(delete_job))
        .route("/jobs/:id/run", post(trigger_run))
}

fn default_agent_type() -> String {
    DEFAULT_AGENT_TYPE.to_string()
}

fn default_timeout() -> i64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_backoff() -> i64 {
    DEFAULT_RETRY_BACKOFF_SECONDS
}

/// Deserialize helper that keeps "field absent" distinct from an explicit
/// `null` (which [`SkillSelection`] maps to `All`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct JobCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub task_prompt: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default)]
    pub agent_config: JsonMap,
    #[serde(default)]
    pub mcp_servers: Vec<serde_json::Value>,
    #[serde(default)]
    pub env_vars: BTreeMap<String, String>,
    #[serde(default)]
    pub credential_ids: Vec<String>,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub skill_ids: SkillSelection,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i64,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_backoff")]
    pub retry_backoff_seconds: i64,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl JobCreate {
    fn into_definition(self, workspace_id: WorkspaceId, now: DateTime<Utc>) -> JobDefinition {
        JobDefinition {
            id: JobId::new(),
            workspace_id,
            name: self.name,
            description: self.description,
            task_prompt: self.task_prompt,
            agent_type: self.agent_type,
            agent_config: self.agent_config,
            mcp_servers: self.mcp_servers,
            env_vars: self.env_vars,
            credential_ids: self.credential_ids,
            labels: self.labels,
            skill_ids: self.skill_ids,
            timeout_seconds: self.timeout_seconds,
            max_retries: self.max_retries,
            retry_backoff_seconds: self.retry_backoff_seconds,
            webhook_url: self.webhook_url,
            webhook_secret: self.webhook_secret,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update: absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct JobUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub task_prompt: Option<String>,
    pub agent_type: Option<String>,
    pub agent_config: Option<JsonMap>,
    pub mcp_servers: Option<Vec<serde_json::Value>>,
    pub env_vars: Option<BTreeMap<String, String>>,
    pub credential_ids: Option<Vec<String>>,
    pub labels: Option<Labels>,
    #[serde(default, deserialize_with = "present")]
    pub skill_ids: Option<SkillSelection>,
    pub timeout_seconds: Option<i64>,
    pub max_retries: Option<u32>,
    pub retry_backoff_seconds: Option<i64>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: JobId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub task_prompt: String,
    pub agent_type: String,
    pub agent_config: JsonMap,
    pub mcp_servers: Vec<serde_json::Value>,
    pub env_vars: BTreeMap<String, String>,
    pub credential_ids: Vec<String>,
    pub labels: Labels,
    pub skill_ids: SkillSelection,
    pub timeout_seconds: i64,
    pub max_retries: u32,
    pub retry_backoff_seconds: i64,
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobDefinition> for JobResponse {
    fn from(job: JobDefinition) -> Self {
        // webhook_secret stays server-side.
        Self {
            id: job.id,
            workspace_id: job.workspace_id,
            name: job.name,
            description: job.description,
            task_prompt: job.task_prompt,
            agent_type: job.agent_type,
            agent_config: job.agent_config,
            mcp_servers: job.mcp_servers,
            env_vars: job.env_vars,
            credential_ids: job.credential_ids,
            labels: job.labels,
            skill_ids: job.skill_ids,
            timeout_seconds: job.timeout_seconds,
            max_retries: job.max_retries,
            retry_backoff_seconds: job.retry_backoff_seconds,
            webhook_url: job.webhook_url,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

async fn list_jobs(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    let jobs = fc_storage::jobs::list(state.db.pool(), &auth.workspace_id).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

async fn create_job(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<JobCreate>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    let job = body.into_definition(auth.workspace_id, Utc::now());
    fc_storage::jobs::insert(state.db.pool(), &job).await?;
    Ok((StatusCode::CREATED, Json(job.into())))
}

async fn get_job(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let job = fc_storage::jobs::get(state.db.pool(), &JobId::from_string(&id), &auth.workspace_id)
        .await?
        .ok_or(ApiError::NotFound("Job"))?;
    Ok(Json(job.into()))
}

async fn update_job(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<JobUpdate>,
) -> Result<Json<JobResponse>, ApiError> {
    let mut job =
        fc_storage::jobs::get(state.db.pool(), &JobId::from_string(&id), &auth.workspace_id)
            .await?
            .ok_or(ApiError::NotFound("Job"))?;

    if let Some(name) = body.name {
        job.name = name;
    }
    if let Some(description) = body.description {
        job.description = Some(description);
    }
    if let Some(task_prompt) = body.task_prompt {
        job.task_prompt = task_prompt;
    }
    if let Some(agent_type) = body.agent_type {
        job.agent_type = agent_type;
    }
    if let Some(agent_config) = body.agent_config {
        job.agent_config = agent_config;
    }
    if let Some(mcp_servers) = body.mcp_servers {
        job.mcp_servers = mcp_servers;
    }
    if let Some(env_vars) = body.env_vars {
        job.env_vars = env_vars;
    }
    if let Some(credential_ids) = body.credential_ids {
        job.credential_ids = credential_ids;
    }
    if let Some(labels) = body.labels {
        job.labels = labels;
    }
    if let Some(skill_ids) = body.skill_ids {
        job.skill_ids = skill_ids;
    }
    if let Some(timeout_seconds) = body.timeout_seconds {
        job.timeout_seconds = timeout_seconds;
    }
    if let Some(max_retries) = body.max_retries {
        job.max_retries = max_retries;
    }
    if let Some(retry_backoff_seconds) = body.retry_backoff_seconds {
        job.retry_backoff_seconds = retry_backoff_seconds;
    }
    if let Some(webhook_url) = body.webhook_url {
        job.webhook_url = Some(webhook_url);
    }
    if let Some(webhook_secret) = body.webhook_secret {
        job.webhook_secret = Some(webhook_secret);
    }
    job.updated_at = Utc::now();

    fc_storage::jobs::update(state.db.pool(), &job).await?;
    Ok(Json(job.into()))
}

async fn delete_job(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted =
        fc_storage::jobs::delete(state.db.pool(), &JobId::from_string(&id), &auth.workspace_id)
            .await?;
    if !deleted {
        return Err(ApiError::NotFound("Job"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn trigger_run(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<RunResponse>), ApiError> {
    let run = lifecycle::trigger_run(
        &state,
        &JobId::from_string(&id),
        &auth.workspace_id,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(run.into())))
}
