// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential CRUD. Values are sealed on write and never returned.

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fc_core::{Credential, CredentialId, WorkspaceId};
use serde::{Deserialize, Serialize};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/credentials", get(list_credentials).post(create_credential))
        .route("/credentials/:id", put(update_credential).delete(delete_credential))
}

#[derive(Debug, Deserialize)]
pub struct CredentialCreate {
    pub name: String,
    pub env_var: String,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialUpdate {
    pub name: Option<String>,
    pub env_var: Option<String>,
    pub value: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub id: CredentialId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub env_var: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Credential> for CredentialResponse {
    fn from(credential: Credential) -> Self {
        Self {
            id: credential.id,
            workspace_id: credential.workspace_id,
            name: credential.name,
            env_var: credential.env_var,
            description: credential.description,
            created_at: credential.created_at,
            updated_at: credential.updated_at,
        }
    }
}

async fn list_credentials(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<CredentialResponse>>, ApiError> {
    let credentials = fc_storage::credentials::list(state.db.pool(), &auth.workspace_id).await?;
    Ok(Json(credentials.into_iter().map(CredentialResponse::from).collect()))
}

async fn create_credential(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(body): Json<CredentialCreate>,
) -> Result<(StatusCode, Json<CredentialResponse>), ApiError> {
    let now = Utc::now();
    let credential = Credential {
        id: CredentialId::new(),
        workspace_id: auth.workspace_id,
        name: body.name,
        env_var: body.env_var,
        encrypted_value: state
            .vault
            .seal(&body.value)
            .map_err(|err| ApiError::Internal(err.to_string()))?,
        description: body.description,
        created_at: now,
        updated_at: now,
    };
    fc_storage::credentials::insert(state.db.pool(), &credential).await?;
    Ok((StatusCode::CREATED, Json(credential.into())))
}

async fn update_credential(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<CredentialUpdate>,
) -> Result<Json<CredentialResponse>, ApiError> {
    let mut credential = fc_storage::credentials::get(
        state.db.pool(),
        &CredentialId::from_string(&id),
        &auth.workspace_id,
    )
    .await?
    .ok_or(ApiError::NotFound("Credential"))?;

    if let Some(name) = body.name {
        credential.name = name;
    }
    if let Some(env_var) = body.env_var {
        credential.env_var = env_var;
    }
    if let Some(value) = body.value {
        credential.encrypted_value =
            state.vault.seal(&value).map_err(|err| ApiError::Internal(err.to_string()))?;
    }
    if let Some(description) = body.description {
        credential.description = Some(description);
    }
    credential.updated_at = Utc::now();

    fc_storage::credentials::update(state.db.pool(), &credential).await?;
    Ok(Json(credential.into()))
}

async fn delete_credential(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let deleted = fc_storage::credentials::delete(
        state.db.pool(),
        &CredentialId::from_string(&id),
        &auth.workspace_id,
    )
    .await?;
    if !deleted {
        return Err(ApiError::NotFound("Credential"));
    }
    Ok(StatusCode::NO_CONTENT)
}
