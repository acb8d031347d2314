// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-tenant surface: workspaces, members, current user

use crate::auth::{AuthContext, RequireAdmin};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use fc_core::{User, Workspace, WorkspaceId};
use fc_storage::principals;
use serde::{Deserialize, Serialize};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/workspaces", get(list_workspaces).post(create_workspace))
        .route("/workspaces/:id", get(get_workspace))
        .route("/workspaces/:id/members", get(list_members))
        .route("/users/me", get(current_user))
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceCreate {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub workspace_id: WorkspaceId,
    pub user_id: fc_core::UserId,
    pub role: fc_core::MemberRole,
    pub username: String,
    pub display_name: Option<String>,
}

async fn list_workspaces(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Workspace>>, ApiError> {
    Ok(Json(principals::workspaces_for_user(state.db.pool(), &auth.user.id).await?))
}

async fn create_workspace(
    State(state): State<AppState>,
    RequireAdmin(auth): RequireAdmin,
    Json(body): Json<WorkspaceCreate>,
) -> Result<(StatusCode, Json<Workspace>), ApiError> {
    let now = Utc::now();
    let workspace = Workspace {
        id: WorkspaceId::new(),
        name: body.name,
        slug: body.slug,
        description: body.description,
        created_at: now,
        updated_at: now,
    };
    principals::create_workspace(state.db.pool(), &workspace, &auth.user.id).await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

async fn get_workspace(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Workspace>, ApiError> {
    let workspace_id = WorkspaceId::from_string(&id);
    // Membership is required to even learn the workspace exists.
    ensure_member(&state, &workspace_id, &auth).await?;
    let workspace = principals::get_workspace(state.db.pool(), &workspace_id)
        .await?
        .ok_or(ApiError::NotFound("Workspace"))?;
    Ok(Json(workspace))
}

async fn list_members(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let workspace_id = WorkspaceId::from_string(&id);
    ensure_member(&state, &workspace_id, &auth).await?;
    let members = principals::members_of(state.db.pool(), &workspace_id).await?;
    Ok(Json(
        members
            .into_iter()
            .map(|(member, user)| MemberResponse {
                workspace_id: member.workspace_id,
                user_id: member.user_id,
                role: member.role,
                username: user.username,
                display_name: user.display_name,
            })
            .collect(),
    ))
}

async fn current_user(auth: AuthContext) -> Json<User> {
    Json(auth.user)
}

async fn ensure_member(
    state: &AppState,
    workspace_id: &WorkspaceId,
    auth: &AuthContext,
) -> Result<(), ApiError> {
    if auth.is_admin() {
        return Ok(());
    }
    principals::membership_role(state.db.pool(), workspace_id, &auth.user.id)
        .await?
        .map(|_| ())
        .ok_or(ApiError::NotFound("Workspace"))
}
