// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill CRUD: multipart upload, metadata updates, file download

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::skills as skill_service;
use crate::state::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fc_core::skill_md::parse_skill_md;
use fc_core::{JsonMap, Skill, SkillFile, SkillId, WorkspaceId};
use serde::{Deserialize, Serialize};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills).post(upload_skill))
        .route("/skills/:id", get(get_skill).put(update_skill).delete(delete_skill))
        .route("/skills/:id/files/*path", get(download_skill_file))
}

#[derive(Debug, Serialize)]
pub struct SkillSummary {
    pub id: SkillId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: String,
    pub license: Option<String>,
    pub compatibility: Option<String>,
    pub allowed_tools: Option<String>,
    pub total_size_bytes: i64,
    pub file_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Skill> for SkillSummary {
    fn from(skill: Skill) -> Self {
        Self {
            id: skill.id,
            workspace_id: skill.workspace_id,
            name: skill.name,
            description: skill.description,
            license: skill.license,
            compatibility: skill.compatibility,
            allowed_tools: skill.allowed_tools,
            total_size_bytes: skill.total_size_bytes,
            file_count: skill.file_count,
            created_at: skill.created_at,
            updated_at: skill.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillFileResponse {
    pub file_path: String,
    pub size_bytes: i64,
    pub checksum_sha256: String,
    pub content_type: String,
}

impl From<SkillFile> for SkillFileResponse {
    fn from(file: SkillFile) -> Self {
        Self {
            file_path: file.file_path,
            size_bytes: file.size_bytes,
            checksum_sha256: file.checksum_sha256,
            content_type: file.content_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillDetail {
    #[serde(flatten)]
    pub summary: SkillSummary,
    pub instructions: String,
    pub metadata: Option<JsonMap>,
    pub files: Vec<SkillFileResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillUpdate {
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub license: Option<String>,
    pub compatibility: Option<String>,
    pub metadata: Option<JsonMap>,
    pub allowed_tools: Option<String>,
}

async fn list_skills(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<SkillSummary>>, ApiError> {
    let skills = fc_storage::skills::list(state.db.pool(), &auth.workspace_id).await?;
    Ok(Json(skills.into_iter().map(SkillSummary::from).collect()))
}

async fn get_skill(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<SkillDetail>, ApiError> {
    let skill =
        fc_storage::skills::get(state.db.pool(), &SkillId::from_string(&id), &auth.workspace_id)
            .await?
            .ok_or(ApiError::NotFound("Skill"))?;
    let files = fc_storage::skills::files_of(state.db.pool(), &skill.id).await?;
    let instructions = skill.instructions.clone();
    let metadata = skill.metadata.clone();
    Ok(Json(SkillDetail {
        summary: skill.into(),
        instructions,
        metadata,
        files: files.into_iter().map(SkillFileResponse::from).collect(),
    }))
}

/// Multipart upload: a required `skill_md` part, optional repeated `files`
/// parts, or a single `zip_file` archive.
async fn upload_skill(
    State(state): State<AppState>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<SkillSummary>), ApiError> {
    let mut skill_md: Option<String> = None;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut zip_file: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Validation(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "skill_md" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::Validation(format!("invalid multipart body: {err}")))?;
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|_| ApiError::Unprocessable("SKILL.md is not UTF-8".to_string()))?;
                skill_md = Some(text);
            }
            "files" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::Validation(format!("invalid multipart body: {err}")))?;
                if !file_name.is_empty() {
                    files.push((file_name, bytes.to_vec()));
                }
            }
            "zip_file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::Validation(format!("invalid multipart body: {err}")))?;
                zip_file = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let skill_md = skill_md
        .ok_or_else(|| ApiError::Validation("multipart field 'skill_md' is required".to_string()))?;
    let parsed =
        parse_skill_md(&skill_md).map_err(|err| ApiError::Unprocessable(err.to_string()))?;

    let extra_files = match zip_file {
        Some(data) => skill_service::extract_zip(&data)?,
        None => files,
    };

    let skill =
        skill_service::create_skill(&state, &auth.workspace_id, &parsed, extra_files, Utc::now())
            .await?;
    Ok((StatusCode::CREATED, Json(skill.into())))
}

async fn update_skill(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
    Json(body): Json<SkillUpdate>,
) -> Result<Json<SkillSummary>, ApiError> {
    let mut skill =
        fc_storage::skills::get(state.db.pool(), &SkillId::from_string(&id), &auth.workspace_id)
            .await?
            .ok_or(ApiError::NotFound("Skill"))?;

    if let Some(description) = body.description {
        skill.description = description;
    }
    if let Some(instructions) = body.instructions {
        skill.instructions = instructions;
    }
    if let Some(license) = body.license {
        skill.license = Some(license);
    }
    if let Some(compatibility) = body.compatibility {
        skill.compatibility = Some(compatibility);
    }
    if let Some(metadata) = body.metadata {
        skill.metadata = Some(metadata);
    }
    if let Some(allowed_tools) = body.allowed_tools {
        skill.allowed_tools = Some(allowed_tools);
    }
    skill.updated_at = Utc::now();

    fc_storage::skills::update_meta(state.db.pool(), &skill).await?;
    Ok(Json(skill.into()))
}

async fn delete_skill(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !skill_service::delete_skill(&state, &auth.workspace_id, &SkillId::from_string(&id)).await? {
        return Err(ApiError::NotFound("Skill"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Raw skill file download; this is the fetch side of the dispatch
/// envelope's file manifests.
async fn download_skill_file(
    State(state): State<AppState>,
    auth: AuthContext,
    Path((id, path)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    if path.split('/').any(|part| part == "..") || path.starts_with('/') {
        return Err(ApiError::Validation("invalid file path".to_string()));
    }
    let skill =
        fc_storage::skills::get(state.db.pool(), &SkillId::from_string(&id), &auth.workspace_id)
            .await?
            .ok_or(ApiError::NotFound("Skill"))?;

    let rel = format!("{}/{}/{}", auth.workspace_id, skill.name, path);
    if !state.skills.exists(&rel).await {
        return Err(ApiError::NotFound("File"));
    }
    let data = state
        .skills
        .read(&rel)
        .await
        .map_err(|err| ApiError::Internal(format!("read skill file: {err}")))?;
    Ok(([(header::CONTENT_TYPE, skill_service::guess_content_type(&path).to_string())], data))
}
