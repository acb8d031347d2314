// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-facing endpoints: register, heartbeat, poll, reporting

use crate::artifacts::save_artifact;
use crate::auth::AuthContext;
use crate::dispatch;
use crate::error::ApiError;
use crate::lifecycle;
use crate::logs;
use crate::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use fc_api::{
    CompleteRequest, DispatchEnvelope, HeartbeatRequest, HeartbeatResponse, LogBatch,
    RegisterRequest, RegisterResponse,
};
use fc_core::{RunId, RunStatus, Worker, WorkerId, WorkerStatus};
use serde::Deserialize;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/workers/register", post(register_worker))
        .route("/workers/heartbeat", post(heartbeat))
        .route("/workers/poll", post(poll))
        .route("/workers/runs/:run_id/logs", post(post_logs))
        .route("/workers/runs/:run_id/artifacts", post(upload_artifact))
        .route("/workers/runs/:run_id/complete", post(complete_run))
}

async fn register_worker(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let now = Utc::now();
    let worker = Worker {
        id: WorkerId::new(),
        workspace_id: auth.workspace_id,
        name: body.name,
        status: WorkerStatus::Online,
        labels: body.labels,
        last_heartbeat: now,
        current_run_id: None,
        created_at: now,
        updated_at: now,
    };
    fc_storage::workers::insert(state.db.pool(), &worker).await?;
    tracing::info!(worker = %worker.id, name = %worker.name, "worker registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { id: worker.id, name: worker.name }),
    ))
}

/// Liveness refresh. The response surfaces a server-side cancellation of
/// the worker's current run so the agent can be stopped before the next
/// poll.
async fn heartbeat(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let now = Utc::now();
    let worker =
        fc_storage::workers::get_in_workspace(state.db.pool(), &body.worker_id, &auth.workspace_id)
            .await?
            .ok_or(ApiError::NotFound("Worker"))?;
    fc_storage::workers::heartbeat(state.db.pool(), &worker.id, body.status, now).await?;

    let mut cancelled_run_id = None;
    if let Some(run_id) = worker.current_run_id {
        if let Some(run) = fc_storage::runs::get(state.db.pool(), &run_id).await? {
            if run.status == RunStatus::Cancelled {
                cancelled_run_id = Some(run_id);
            }
        }
    }
    Ok(Json(HeartbeatResponse { status: "ok".to_string(), cancelled_run_id }))
}

#[derive(Debug, Deserialize)]
struct PollQuery {
    worker_id: String,
}

async fn poll(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<PollQuery>,
) -> Result<Json<Option<DispatchEnvelope>>, ApiError> {
    let worker_id = WorkerId::from_string(&query.worker_id);
    // The worker must belong to the caller's workspace.
    if fc_storage::workers::get_in_workspace(state.db.pool(), &worker_id, &auth.workspace_id)
        .await?
        .is_none()
    {
        return Ok(Json(None));
    }
    Ok(Json(dispatch::poll(&state, &worker_id, Utc::now()).await?))
}

async fn post_logs(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(run_id): Path<String>,
    Json(body): Json<LogBatch>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = RunId::from_string(&run_id);
    ensure_run_in_workspace(&state, &run_id, &auth).await?;
    let appended = logs::append_logs(&state, &run_id, &body.lines, Utc::now()).await?;
    Ok(Json(serde_json::json!({ "appended": appended })))
}

async fn upload_artifact(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(run_id): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<fc_storage::artifacts::Artifact>), ApiError> {
    let run_id = RunId::from_string(&run_id);
    ensure_run_in_workspace(&state, &run_id, &auth).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("unnamed").to_string();
        let content_type =
            field.content_type().unwrap_or("application/octet-stream").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| ApiError::Validation(format!("invalid multipart body: {err}")))?;
        let artifact = save_artifact(
            &state,
            &auth.workspace_id,
            &run_id,
            &filename,
            &content_type,
            &data,
            Utc::now(),
        )
        .await?;
        return Ok((StatusCode::CREATED, Json(artifact)));
    }
    Err(ApiError::Validation("multipart field 'file' is required".to_string()))
}

#[derive(Debug, Deserialize)]
struct CompleteQuery {
    #[serde(default)]
    worker_id: String,
}

async fn complete_run(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(run_id): Path<String>,
    Query(query): Query<CompleteQuery>,
    Json(body): Json<CompleteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let run_id = RunId::from_string(&run_id);
    ensure_run_in_workspace(&state, &run_id, &auth).await?;
    let status = lifecycle::complete_run(
        &state,
        &WorkerId::from_string(&query.worker_id),
        &run_id,
        body.status,
        body.result,
        body.exit_code,
        Utc::now(),
    )
    .await?;
    Ok(Json(serde_json::json!({ "status": status })))
}

async fn ensure_run_in_workspace(
    state: &AppState,
    run_id: &RunId,
    auth: &AuthContext,
) -> Result<(), ApiError> {
    fc_storage::runs::get_in_workspace(state.db.pool(), run_id, &auth.workspace_id)
        .await?
        .map(|_| ())
        .ok_or(ApiError::NotFound("Run"))
}
