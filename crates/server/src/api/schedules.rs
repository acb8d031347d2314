// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule CRUD. Cron expressions are validated on write; the gate is
//! recomputed whenever the expression or enablement changes.

use crate::auth::AuthContext;
use crate::cron_expr;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fc_core::{JobId, RunId, Schedule, ScheduleId, WorkspaceId};
use serde::{Deserialize, Serialize};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route("/schedules/:id", put(update_schedule).delete(delete_schedule))
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ScheduleCreate {
    pub job_definition_id: String,
    pub cron_expression: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScheduleUpdate {
    pub job_definition_id: Option<String>,
    pub cron_expression: Option<String>,
    pub enabled: Option<bool>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub id: ScheduleId,
    pub workspace_id: WorkspaceId,
    pub job_definition_id: JobId,
    pub job_name: Option<String>,
    pub cron_expression: String,
    pub enabled: bool,
    pub name: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run_id: Option<RunId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleResponse {
    fn new(schedule: Schedule, job_name: Option<String>) -> Self {
        Self {
            id: schedule.id,
            workspace_id: schedule.workspace_id,
            job_definition_id: schedule.job_definition_id,
            job_name,
            cron_expression: schedule.cron_expression,
            enabled: schedule.enabled,
            name: schedule.name,
            next_run_at: schedule.next_run_at,
            last_run_at: schedule.last_run_at,
            last_run_id: schedule.last_run_id,
            created_at: schedule.created_at,
            updated_at: schedule.updated_at,
        }
    }
}

async fn job_name(
    state: &AppState,
    job_id: &JobId,
    workspace_id: &WorkspaceId,
) -> Result<Option<String>, ApiError> {
    Ok(fc_storage::jobs::get(state.db.pool(), job_id, workspace_id).await?.map(|j| j.name))
}

async fn list_schedules(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<ScheduleResponse>>, ApiError> {
    let schedules = fc_storage::schedules::list(state.db.pool(), &auth.workspace_id).await?;
    let mut out = Vec::with_capacity(schedules.len());
    for schedule in schedules {
        let name = job_name(&state, &schedule.job_definition_id, &auth.workspace_id).await?;
        out.push(ScheduleResponse::new(schedule, name));
    }
    Ok(Json(out))
}

async fn create_schedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<ScheduleCreate>,
) -> Result<(StatusCode, Json<ScheduleResponse>), ApiError> {
    cron_expr::validate(&body.cron_expression)?;
    let now = Utc::now();
    let next_run_at = if body.enabled {
        cron_expr::next_fire(&body.cron_expression, now)?
    } else {
        None
    };
    let schedule = Schedule {
        id: ScheduleId::new(),
        workspace_id: auth.workspace_id.clone(),
        job_definition_id: JobId::from_string(&body.job_definition_id),
        cron_expression: body.cron_expression,
        enabled: body.enabled,
        name: body.name,
        next_run_at,
        last_run_at: None,
        last_run_id: None,
        created_at: now,
        updated_at: now,
    };
    fc_storage::schedules::insert(state.db.pool(), &schedule).await?;
    let name = job_name(&state, &schedule.job_definition_id, &auth.workspace_id).await?;
    Ok((StatusCode::CREATED, Json(ScheduleResponse::new(schedule, name))))
}

async fn update_schedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<ScheduleUpdate>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let mut schedule = fc_storage::schedules::get(
        state.db.pool(),
        &ScheduleId::from_string(&id),
        &auth.workspace_id,
    )
    .await?
    .ok_or(ApiError::NotFound("Schedule"))?;

    if let Some(cron_expression) = body.cron_expression {
        cron_expr::validate(&cron_expression)?;
        schedule.cron_expression = cron_expression;
    }
    if let Some(job_definition_id) = body.job_definition_id {
        schedule.job_definition_id = JobId::from_string(&job_definition_id);
    }
    if let Some(enabled) = body.enabled {
        schedule.enabled = enabled;
    }
    if let Some(name) = body.name {
        schedule.name = Some(name);
    }

    let now = Utc::now();
    schedule.next_run_at =
        if schedule.enabled { cron_expr::next_fire(&schedule.cron_expression, now)? } else { None };
    schedule.updated_at = now;

    fc_storage::schedules::update(state.db.pool(), &schedule).await?;
    let name = job_name(&state, &schedule.job_definition_id, &auth.workspace_id).await?;
    Ok(Json(ScheduleResponse::new(schedule, name)))
}

async fn delete_schedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = fc_storage::schedules::delete(
        state.db.pool(),
        &ScheduleId::from_string(&id),
        &auth.workspace_id,
    )
    .await?;
    if !deleted {
        return Err(ApiError::NotFound("Schedule"));
    }
    Ok(StatusCode::NO_CONTENT)
}
