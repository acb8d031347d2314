// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher: atomic claim of the oldest eligible run for a polling
//! worker, plus envelope assembly

use crate::error::ApiError;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use fc_api::{DispatchEnvelope, SkillFileRef, SkillManifest};
use fc_core::{labels_match, JobRun, SkillSelection, WorkerId};
use std::collections::BTreeMap;

/// Claim at most one queued run for `worker_id` and assemble its dispatch
/// envelope.
///
/// Eligibility: same workspace, `queued`, past any `scheduled_at` gate,
/// and the worker's labels satisfy the run's `required_labels`. Candidates
/// are scanned oldest-first; when a conditional claim loses a race the
/// scan simply moves to the next candidate, and an exhausted scan means
/// no work.
pub async fn poll(
    state: &AppState,
    worker_id: &WorkerId,
    now: DateTime<Utc>,
) -> Result<Option<DispatchEnvelope>, ApiError> {
    let Some(worker) = fc_storage::workers::get(state.db.pool(), worker_id).await? else {
        return Ok(None);
    };

    let candidates =
        fc_storage::runs::queued_candidates(state.db.pool(), &worker.workspace_id, now).await?;
    for candidate in &candidates {
        if !labels_match(&candidate.required_labels, &worker.labels) {
            continue;
        }
        if fc_storage::runs::claim(state.db.pool(), &candidate.id, &worker.id, now).await? {
            // Re-read so the envelope reflects the committed assignment.
            let Some(run) = fc_storage::runs::get(state.db.pool(), &candidate.id).await? else {
                return Ok(None);
            };
            tracing::info!(
                run = %run.id,
                worker = %worker.id,
                attempt = run.attempt_number,
                "dispatched run"
            );
            return Ok(Some(build_envelope(state, &run).await?));
        }
    }
    Ok(None)
}

/// Assemble the poll response for a freshly claimed run: decrypted
/// credentials, skill manifests, and the run snapshot.
pub async fn build_envelope(
    state: &AppState,
    run: &JobRun,
) -> Result<DispatchEnvelope, ApiError> {
    Ok(DispatchEnvelope {
        run_id: run.id.clone(),
        name: run.name.clone(),
        task_prompt: run.task_prompt.clone(),
        agent_type: run.agent_type.clone(),
        agent_config: run.agent_config.clone(),
        mcp_servers: run.mcp_servers.clone(),
        env_vars: run.env_vars.clone(),
        credentials: resolve_credentials(state, run).await?,
        skills: resolve_skills(state, run).await?,
        timeout_seconds: run.timeout_seconds,
    })
}

/// Resolve credential names to `env_var → plaintext`. Unknown names are
/// absent; per-credential decryption failures are logged and skipped so a
/// single bad secret never aborts dispatch.
async fn resolve_credentials(
    state: &AppState,
    run: &JobRun,
) -> Result<BTreeMap<String, String>, ApiError> {
    let mut credentials = BTreeMap::new();
    if run.credential_ids.is_empty() {
        return Ok(credentials);
    }
    let rows = fc_storage::credentials::by_names(
        state.db.pool(),
        &run.workspace_id,
        &run.credential_ids,
    )
    .await?;
    for credential in rows {
        match state.vault.open(&credential.encrypted_value) {
            Ok(plaintext) => {
                credentials.insert(credential.env_var.clone(), plaintext);
            }
            Err(err) => {
                tracing::warn!(
                    credential = %credential.name,
                    run = %run.id,
                    error = %err,
                    "skipping credential that failed to decrypt"
                );
            }
        }
    }
    Ok(credentials)
}

/// Resolve the run's skill selection into manifests with file digests.
async fn resolve_skills(state: &AppState, run: &JobRun) -> Result<Vec<SkillManifest>, ApiError> {
    let skills = match &run.skill_ids {
        SkillSelection::All => {
            fc_storage::skills::list(state.db.pool(), &run.workspace_id).await?
        }
        SkillSelection::Named(names) if names.is_empty() => return Ok(Vec::new()),
        SkillSelection::Named(names) => {
            fc_storage::skills::by_names(state.db.pool(), &run.workspace_id, names).await?
        }
    };

    let mut manifests = Vec::with_capacity(skills.len());
    for skill in skills {
        let files = fc_storage::skills::files_of(state.db.pool(), &skill.id).await?;
        manifests.push(SkillManifest {
            id: skill.id,
            name: skill.name,
            instructions: skill.instructions,
            allowed_tools: skill.allowed_tools,
            files: files
                .into_iter()
                .map(|f| SkillFileRef {
                    file_path: f.file_path,
                    size_bytes: f.size_bytes,
                    checksum_sha256: f.checksum_sha256,
                    content_type: f.content_type,
                })
                .collect(),
        });
    }
    Ok(manifests)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
