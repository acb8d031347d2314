// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill service: SKILL.md ingestion, file persistence, zip safety

use crate::error::ApiError;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use fc_core::skill_md::{render_skill_md, ParsedSkill};
use fc_core::{Skill, SkillFile, SkillId, WorkspaceId};
use sha2::{Digest, Sha256};
use std::io::Read;

pub const MAX_ZIP_FILE_COUNT: usize = 500;
pub const MAX_ZIP_EXTRACTED_SIZE: u64 = 50 * 1024 * 1024;

/// Create a skill from parsed SKILL.md data plus extra files.
///
/// The rendered SKILL.md is always stored as the package's first file;
/// bytes land in the skill store under
/// `{workspace_id}/{skill_name}/{relative_path}` and the manifest rows
/// carry checksums for worker-side verification.
pub async fn create_skill(
    state: &AppState,
    workspace_id: &WorkspaceId,
    parsed: &ParsedSkill,
    extra_files: Vec<(String, Vec<u8>)>,
    now: DateTime<Utc>,
) -> Result<Skill, ApiError> {
    if fc_storage::skills::get_by_name(state.db.pool(), workspace_id, &parsed.name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Skill '{}' already exists in this workspace",
            parsed.name
        )));
    }

    let skill_id = SkillId::new();
    let rendered = render_skill_md(parsed)
        .map_err(|err| ApiError::Unprocessable(err.to_string()))?
        .into_bytes();

    let mut all_files: Vec<(String, Vec<u8>)> = vec![("SKILL.md".to_string(), rendered)];
    all_files.extend(extra_files);

    let mut manifest = Vec::with_capacity(all_files.len());
    let mut total_size = 0i64;
    for (file_path, data) in &all_files {
        let rel = format!("{}/{}/{}", workspace_id, parsed.name, file_path);
        state
            .skills
            .save(&rel, data)
            .await
            .map_err(|err| ApiError::Internal(format!("write skill file: {err}")))?;
        total_size += data.len() as i64;
        manifest.push(SkillFile {
            skill_id: skill_id.clone(),
            file_path: file_path.clone(),
            size_bytes: data.len() as i64,
            checksum_sha256: format!("{:x}", Sha256::digest(data)),
            content_type: guess_content_type(file_path).to_string(),
        });
    }

    let skill = Skill {
        id: skill_id,
        workspace_id: workspace_id.clone(),
        name: parsed.name.clone(),
        description: parsed.description.clone(),
        instructions: parsed.instructions.clone(),
        license: parsed.license.clone(),
        compatibility: parsed.compatibility.clone(),
        metadata: parsed.metadata.clone(),
        allowed_tools: parsed.allowed_tools.clone(),
        total_size_bytes: total_size,
        file_count: manifest.len() as i64,
        created_at: now,
        updated_at: now,
    };
    fc_storage::skills::insert_with_files(state.db.pool(), &skill, &manifest).await?;
    tracing::info!(skill = %skill.id, name = %skill.name, files = skill.file_count, "skill created");
    Ok(skill)
}

/// Delete a skill: manifest rows and the on-disk tree.
pub async fn delete_skill(
    state: &AppState,
    workspace_id: &WorkspaceId,
    skill_id: &SkillId,
) -> Result<bool, ApiError> {
    let Some(skill) = fc_storage::skills::get(state.db.pool(), skill_id, workspace_id).await?
    else {
        return Ok(false);
    };
    state
        .skills
        .delete_tree(&format!("{}/{}", workspace_id, skill.name))
        .await
        .map_err(|err| ApiError::Internal(format!("delete skill tree: {err}")))?;
    Ok(fc_storage::skills::delete(state.db.pool(), skill_id, workspace_id).await?)
}

/// Extract a zip archive with safety checks: no traversal or absolute
/// paths, bounded entry count and extracted size. Any `SKILL.md` inside
/// the archive is skipped — the explicitly uploaded one wins.
pub fn extract_zip(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>, ApiError> {
    let cursor = std::io::Cursor::new(data);
    let mut archive = zip::ZipArchive::new(cursor)
        .map_err(|err| ApiError::Unprocessable(format!("invalid zip archive: {err}")))?;

    let mut result = Vec::new();
    let mut total_size = 0u64;
    let mut file_count = 0usize;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| ApiError::Unprocessable(format!("invalid zip entry: {err}")))?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if name.split('/').any(|part| part == "..") || name.starts_with('/') {
            return Err(ApiError::Unprocessable(format!("Unsafe path in zip: {name}")));
        }
        file_count += 1;
        if file_count > MAX_ZIP_FILE_COUNT {
            return Err(ApiError::Unprocessable(format!(
                "Zip contains too many files (max {MAX_ZIP_FILE_COUNT})"
            )));
        }

        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|err| ApiError::Unprocessable(format!("unreadable zip entry: {err}")))?;
        total_size += bytes.len() as u64;
        if total_size > MAX_ZIP_EXTRACTED_SIZE {
            return Err(ApiError::Unprocessable(format!(
                "Zip extracted size exceeds limit ({}MB)",
                MAX_ZIP_EXTRACTED_SIZE / (1024 * 1024)
            )));
        }

        if name == "SKILL.md" {
            continue;
        }
        result.push((name, bytes));
    }
    Ok(result)
}

/// Minimal extension-based MIME guess for manifest rows.
pub fn guess_content_type(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or_default();
    match ext {
        "md" => "text/markdown",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "js" => "text/javascript",
        "py" => "text/x-python",
        "rs" => "text/x-rust",
        "sh" => "application/x-sh",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[path = "skills_tests.rs"]
mod tests;
