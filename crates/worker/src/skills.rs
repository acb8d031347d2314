// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Skill fetch: download manifest files, verify checksums, stage on disk

use crate::client::ServerClient;
use fc_api::SkillManifest;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Download every attached skill into `{work_dir}/skills/{name}/…`.
///
/// Checksum mismatches and failed downloads skip the file with a warning;
/// a partial skill is better than a failed run. Files under `scripts/`
/// are made executable.
pub async fn stage_skills(
    client: &ServerClient,
    skills: &[SkillManifest],
    work_dir: &Path,
) -> std::io::Result<()> {
    if skills.is_empty() {
        return Ok(());
    }
    let skills_root = work_dir.join("skills");
    std::fs::create_dir_all(&skills_root)?;

    for skill in skills {
        let skill_dir = skills_root.join(&skill.name);
        std::fs::create_dir_all(&skill_dir)?;

        for file in &skill.files {
            let data = match client.download_skill_file(&skill.id, &file.file_path).await {
                Ok(data) => data,
                Err(err) => {
                    tracing::warn!(
                        skill = %skill.name,
                        file = %file.file_path,
                        error = %err,
                        "skill file download failed"
                    );
                    continue;
                }
            };

            let actual = format!("{:x}", Sha256::digest(&data));
            if actual != file.checksum_sha256 {
                tracing::warn!(
                    skill = %skill.name,
                    file = %file.file_path,
                    expected = %file.checksum_sha256,
                    actual = %actual,
                    "skill file checksum mismatch"
                );
                continue;
            }

            let dest = skill_dir.join(&file.file_path);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&dest, &data)?;

            #[cfg(unix)]
            if file.file_path.starts_with("scripts/") {
                use std::os::unix::fs::PermissionsExt;
                let mut perms = std::fs::metadata(&dest)?.permissions();
                perms.set_mode(perms.mode() | 0o111);
                std::fs::set_permissions(&dest, perms)?;
            }
        }
        tracing::info!(skill = %skill.name, files = skill.files.len(), "staged skill");
    }
    Ok(())
}
