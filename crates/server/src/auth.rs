// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization gate: bearer token + workspace header → `AuthContext`

use crate::error::ApiError;
use crate::state::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use fc_core::{ApiKey, ApiKeyId, KeyRole, User, UserId, WorkspaceId};
use fc_storage::principals::{self, DEFAULT_ADMIN_USER_ID, DEFAULT_WORKSPACE_ID};
use sha2::{Digest, Sha256};

pub const WORKSPACE_HEADER: &str = "X-Workspace-ID";

/// SHA-256 hex of a raw API token; the only form ever stored or compared.
pub fn hash_key(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

/// The validated `(user, api_key, workspace)` tuple every handler works
/// from. Existence of cross-workspace entities is never revealed past
/// this point.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub api_key: ApiKey,
    pub workspace_id: WorkspaceId,
}

impl AuthContext {
    pub fn is_admin(&self) -> bool {
        self.api_key.role == KeyRole::Admin
    }
}

/// Resolve a bearer token and workspace header into an [`AuthContext`].
pub async fn authenticate(
    state: &AppState,
    token: &str,
    workspace_id: &WorkspaceId,
) -> Result<AuthContext, ApiError> {
    let (api_key, user) = if token == state.config.default_admin_key {
        // Bootstrap path: synthesise an admin key bound to the seeded user.
        let user_id = UserId::from_string(DEFAULT_ADMIN_USER_ID);
        let user = principals::get_user(state.db.pool(), &user_id).await?.unwrap_or(User {
            id: user_id,
            username: "admin".to_string(),
            display_name: Some("Admin".to_string()),
            created_at: Utc::now(),
        });
        let api_key = ApiKey {
            id: ApiKeyId::from_string("default"),
            name: "default-admin".to_string(),
            key_hash: String::new(),
            role: KeyRole::Admin,
            user_id: user.id.clone(),
            created_at: user.created_at,
        };
        (api_key, user)
    } else {
        let api_key = principals::api_key_by_hash(state.db.pool(), &hash_key(token))
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid API key".to_string()))?;
        let user = principals::get_user(state.db.pool(), &api_key.user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found for API key".to_string()))?;
        (api_key, user)
    };

    let membership =
        principals::membership_role(state.db.pool(), workspace_id, &user.id).await?;
    if membership.is_none() {
        return Err(ApiError::Forbidden(format!(
            "Not a member of workspace '{}'",
            workspace_id
        )));
    }

    Ok(AuthContext { user, api_key, workspace_id: workspace_id.clone() })
}

fn bearer_token(parts: &Parts) -> Result<String, ApiError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
    header
        .strip_prefix("Bearer ")
        .map(|t| t.to_string())
        .ok_or_else(|| ApiError::Unauthorized("Expected bearer token".to_string()))
}

fn workspace_header(parts: &Parts) -> WorkspaceId {
    parts
        .headers
        .get(WORKSPACE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(WorkspaceId::from_string)
        .unwrap_or_else(|| WorkspaceId::from_string(DEFAULT_WORKSPACE_ID))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let workspace_id = workspace_header(parts);
        authenticate(state, &token, &workspace_id).await
    }
}

/// Extractor for admin-gated endpoints.
pub struct RequireAdmin(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthContext::from_request_parts(parts, state).await?;
        if !auth.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(RequireAdmin(auth))
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
