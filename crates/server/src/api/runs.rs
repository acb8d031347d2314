// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ad-hoc runs, run inspection, log reads, SSE streaming, artifacts

use crate::artifacts::read_artifact_data;
use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::lifecycle;
use crate::logs;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fc_api::LogLine;
use fc_core::job::{DEFAULT_AGENT_TYPE, DEFAULT_TIMEOUT_SECONDS};
use fc_core::{
    ArtifactId, JobId, JobRun, JsonMap, Labels, RunId, RunStatus, SkillSelection, WorkerId,
    WorkspaceId,
};
use futures_util::stream::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/runs", get(list_runs).post(create_adhoc_run))
        .route("/runs/:id", get(get_run))
        .route("/runs/:id/cancel", post(cancel_run))
        .route("/runs/:id/logs", get(get_logs))
        .route("/runs/:id/logs/stream", get(stream_logs))
        .route("/runs/:id/artifacts", get(list_artifacts))
        .route("/runs/:id/artifacts/:aid", get(download_artifact))
}

fn default_agent_type() -> String {
    DEFAULT_AGENT_TYPE.to_string()
}

fn default_timeout() -> i64 {
    DEFAULT_TIMEOUT_SECONDS
}

#[derive(Debug, Deserialize)]
pub struct RunCreate {
    pub name: String,
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
    pub required_labels: Labels,
    #[serde(default)]
    pub skill_ids: SkillSelection,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: i64,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub id: RunId,
    pub workspace_id: WorkspaceId,
    pub job_definition_id: Option<JobId>,
    pub status: RunStatus,
    pub worker_id: Option<WorkerId>,
    pub name: String,
    pub task_prompt: String,
    pub agent_type: String,
    pub agent_config: JsonMap,
    pub mcp_servers: Vec<serde_json::Value>,
    pub env_vars: BTreeMap<String, String>,
    pub credential_ids: Vec<String>,
    pub required_labels: Labels,
    pub skill_ids: SkillSelection,
    pub timeout_seconds: i64,
    pub max_retries: u32,
    pub retry_backoff_seconds: i64,
    pub attempt_number: u32,
    pub parent_run_id: Option<RunId>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
    pub exit_code: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobRun> for RunResponse {
    fn from(run: JobRun) -> Self {
        Self {
            id: run.id,
            workspace_id: run.workspace_id,
            job_definition_id: run.job_definition_id,
            status: run.status,
            worker_id: run.worker_id,
            name: run.name,
            task_prompt: run.task_prompt,
            agent_type: run.agent_type,
            agent_config: run.agent_config,
            mcp_servers: run.mcp_servers,
            env_vars: run.env_vars,
            credential_ids: run.credential_ids,
            required_labels: run.required_labels,
            skill_ids: run.skill_ids,
            timeout_seconds: run.timeout_seconds,
            max_retries: run.max_retries,
            retry_backoff_seconds: run.retry_backoff_seconds,
            attempt_number: run.attempt_number,
            parent_run_id: run.parent_run_id,
            scheduled_at: run.scheduled_at,
            started_at: run.started_at,
            completed_at: run.completed_at,
            result: run.result,
            exit_code: run.exit_code,
            created_at: run.created_at,
            updated_at: run.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    job_id: Option<String>,
    status: Option<String>,
}

async fn list_runs(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<RunResponse>>, ApiError> {
    let job_id = query.job_id.map(JobId::from_string);
    let status = query
        .status
        .as_deref()
        .map(|s| s.parse::<RunStatus>())
        .transpose()
        .map_err(|err| ApiError::Validation(err.to_string()))?;
    let runs =
        fc_storage::runs::list(state.db.pool(), &auth.workspace_id, job_id.as_ref(), status)
            .await?;
    Ok(Json(runs.into_iter().map(RunResponse::from).collect()))
}

async fn create_adhoc_run(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<RunCreate>,
) -> Result<(StatusCode, Json<RunResponse>), ApiError> {
    let now = Utc::now();
    let run = JobRun {
        id: RunId::new(),
        workspace_id: auth.workspace_id,
        job_definition_id: None,
        status: RunStatus::Queued,
        worker_id: None,
        name: body.name,
        task_prompt: body.task_prompt,
        agent_type: body.agent_type,
        agent_config: body.agent_config,
        mcp_servers: body.mcp_servers,
        env_vars: body.env_vars,
        credential_ids: body.credential_ids,
        required_labels: body.required_labels,
        skill_ids: body.skill_ids,
        timeout_seconds: body.timeout_seconds,
        max_retries: 0,
        retry_backoff_seconds: fc_core::job::DEFAULT_RETRY_BACKOFF_SECONDS,
        attempt_number: 1,
        parent_run_id: None,
        webhook_url: None,
        webhook_secret: None,
        scheduled_at: None,
        started_at: None,
        completed_at: None,
        result: None,
        exit_code: None,
        created_at: now,
        updated_at: now,
    };
    fc_storage::runs::insert(state.db.pool(), &run).await?;
    Ok((StatusCode::CREATED, Json(run.into())))
}

async fn get_run(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = fc_storage::runs::get_in_workspace(
        state.db.pool(),
        &RunId::from_string(&id),
        &auth.workspace_id,
    )
    .await?
    .ok_or(ApiError::NotFound("Run"))?;
    Ok(Json(run.into()))
}

async fn cancel_run(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = lifecycle::cancel_run(
        &state,
        &RunId::from_string(&id),
        &auth.workspace_id,
        Utc::now(),
    )
    .await?;
    Ok(Json(run.into()))
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    #[serde(default)]
    after: i64,
}

async fn get_logs(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<serde_json::Value>>, ApiError> {
    let run_id = RunId::from_string(&id);
    ensure_run_visible(&state, &run_id, &auth).await?;
    let entries = logs::get_logs(&state, &run_id, query.after).await?;
    Ok(Json(
        entries
            .into_iter()
            .map(|entry| {
                serde_json::json!({
                    "stream": entry.stream,
                    "line": entry.line,
                    "sequence": entry.sequence,
                })
            })
            .collect(),
    ))
}

/// SSE stream of live log lines: a `log` event per line, a `ping` event
/// after 30 s of idleness. Client disconnect drops the queue, which the
/// registry prunes on the next publish.
async fn stream_logs(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let run_id = RunId::from_string(&id);
    ensure_run_visible(&state, &run_id, &auth).await?;
    let rx = state.subscribers.subscribe(run_id);

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        match tokio::time::timeout(Duration::from_secs(30), rx.recv()).await {
            Ok(Some(line)) => Some((Ok(log_event(&line)), rx)),
            Ok(None) => None,
            Err(_) => Some((Ok(Event::default().event("ping").data("")), rx)),
        }
    });
    Ok(Sse::new(stream))
}

fn log_event(line: &LogLine) -> Event {
    match serde_json::to_string(line) {
        Ok(data) => Event::default().event("log").data(data),
        Err(_) => Event::default().event("ping").data(""),
    }
}

async fn list_artifacts(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Vec<fc_storage::artifacts::Artifact>>, ApiError> {
    let run_id = RunId::from_string(&id);
    ensure_run_visible(&state, &run_id, &auth).await?;
    Ok(Json(fc_storage::artifacts::list_by_run(state.db.pool(), &run_id).await?))
}

async fn download_artifact(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, aid)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let run_id = RunId::from_string(&id);
    ensure_run_visible(&state, &run_id, &auth).await?;
    let artifact = fc_storage::artifacts::get(
        state.db.pool(),
        &ArtifactId::from_string(&aid),
        &auth.workspace_id,
    )
    .await?
    .filter(|a| a.run_id == run_id)
    .ok_or(ApiError::NotFound("Artifact"))?;

    let data = read_artifact_data(&state, &artifact).await?;
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.filename),
            ),
        ],
        data,
    ))
}

async fn ensure_run_visible(
    state: &AppState,
    run_id: &RunId,
    auth: &AuthContext,
) -> Result<(), ApiError> {
    fc_storage::runs::get_in_workspace(state.db.pool(), run_id, &auth.workspace_id)
        .await?
        .map(|_| ())
        .ok_or(ApiError::NotFound("Run"))
}
