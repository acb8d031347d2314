// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle controller: terminal transitions, cancellation, retry
//! chains, and the run timeout sweep

use crate::error::ApiError;
use crate::state::AppState;
use crate::webhook;
use chrono::{DateTime, Utc};
use fc_core::{JobId, JobRun, RunId, RunStatus, WorkerId, WorkspaceId};

/// Create a fresh queued run snapshotted from a job definition.
pub async fn trigger_run(
    state: &AppState,
    job_id: &JobId,
    workspace_id: &WorkspaceId,
    now: DateTime<Utc>,
) -> Result<JobRun, ApiError> {
    let job = fc_storage::jobs::get(state.db.pool(), job_id, workspace_id)
        .await?
        .ok_or(ApiError::NotFound("Job"))?;
    let run = JobRun::from_definition(&job, now);
    fc_storage::runs::insert(state.db.pool(), &run).await?;
    Ok(run)
}

/// Apply a worker-reported terminal status.
///
/// If the server already cancelled the run, the incoming status is ignored
/// (the cancel wins) but the worker is still freed. Any other
/// already-terminal state is left untouched — terminal states are
/// absorbing. Otherwise the transition lands, the worker is freed, a retry
/// child may be spawned, and the webhook fires without blocking.
pub async fn complete_run(
    state: &AppState,
    worker_id: &WorkerId,
    run_id: &RunId,
    status: RunStatus,
    result: Option<String>,
    exit_code: Option<i64>,
    now: DateTime<Utc>,
) -> Result<RunStatus, ApiError> {
    if !status.is_terminal() {
        return Err(ApiError::Validation(format!(
            "'{status}' is not a terminal status"
        )));
    }

    let run = fc_storage::runs::get(state.db.pool(), run_id)
        .await?
        .ok_or(ApiError::NotFound("Run"))?;

    if run.status.is_terminal() {
        // Cancelled (or already swept) on the server side; the worker's
        // report arrives late and is dropped.
        fc_storage::workers::free(state.db.pool(), worker_id, run_id, now).await?;
        tracing::debug!(run = %run_id, reported = %status, kept = %run.status,
            "ignoring terminal report for finished run");
        return Ok(run.status);
    }

    let applied = fc_storage::runs::finish(
        state.db.pool(),
        run_id,
        status,
        result.as_deref(),
        exit_code,
        now,
    )
    .await?;
    fc_storage::workers::free(state.db.pool(), worker_id, run_id, now).await?;

    if !applied {
        // Lost a race with cancel or the timeout sweep; report what stuck.
        let run = fc_storage::runs::get(state.db.pool(), run_id)
            .await?
            .ok_or(ApiError::NotFound("Run"))?;
        return Ok(run.status);
    }

    let run = fc_storage::runs::get(state.db.pool(), run_id)
        .await?
        .ok_or(ApiError::NotFound("Run"))?;
    tracing::info!(run = %run_id, status = %run.status, exit_code = ?exit_code, "run finished");
    finalize(state, &run, now).await?;
    Ok(run.status)
}

/// Cancel a run still in `{queued, assigned, running}`. Workers observe
/// the cancellation through the heartbeat response; a worker already
/// executing keeps going until then, and its eventual terminal report is
/// ignored.
pub async fn cancel_run(
    state: &AppState,
    run_id: &RunId,
    workspace_id: &WorkspaceId,
    now: DateTime<Utc>,
) -> Result<JobRun, ApiError> {
    let run = fc_storage::runs::get_in_workspace(state.db.pool(), run_id, workspace_id)
        .await?
        .ok_or(ApiError::NotFound("Run"))?;
    if !fc_storage::runs::cancel(state.db.pool(), run_id, workspace_id, now).await? {
        return Err(ApiError::Validation(format!(
            "Run cannot be cancelled from status '{}'",
            run.status
        )));
    }
    // A queued run never touched a worker; an in-flight one stays attached
    // until the worker reports in and gets freed by complete_run.
    let run = fc_storage::runs::get(state.db.pool(), run_id)
        .await?
        .ok_or(ApiError::NotFound("Run"))?;
    tracing::info!(run = %run_id, "run cancelled");
    // Cancellation is a terminal transition too; no retry, but the hook
    // still fires.
    webhook::fire(state, &run);
    Ok(run)
}

/// Flip every expired in-flight run to `timeout`, freeing workers and
/// spawning retries exactly like worker-reported failures.
pub async fn sweep_timeouts(state: &AppState, now: DateTime<Utc>) -> Result<u32, ApiError> {
    let expired = fc_storage::runs::timed_out(state.db.pool(), now).await?;
    let mut swept = 0;
    for run in expired {
        let applied = fc_storage::runs::finish(
            state.db.pool(),
            &run.id,
            RunStatus::Timeout,
            Some("run exceeded its timeout"),
            None,
            now,
        )
        .await?;
        if !applied {
            continue;
        }
        if let Some(worker_id) = &run.worker_id {
            fc_storage::workers::free(state.db.pool(), worker_id, &run.id, now).await?;
        }
        let run = match fc_storage::runs::get(state.db.pool(), &run.id).await? {
            Some(run) => run,
            None => continue,
        };
        tracing::warn!(run = %run.id, timeout_seconds = run.timeout_seconds, "run timed out");
        finalize(state, &run, now).await?;
        swept += 1;
    }
    Ok(swept)
}

/// Shared tail of every terminal transition: retry bookkeeping plus the
/// fire-and-forget webhook.
async fn finalize(state: &AppState, run: &JobRun, now: DateTime<Utc>) -> Result<(), ApiError> {
    if matches!(run.status, RunStatus::Failed | RunStatus::Timeout) {
        if let Some(child) = run.retry_child(now) {
            fc_storage::runs::insert(state.db.pool(), &child).await?;
            tracing::info!(
                run = %run.id,
                child = %child.id,
                attempt = child.attempt_number,
                scheduled_at = ?child.scheduled_at,
                "spawned retry run"
            );
        }
    }
    webhook::fire(state, run);
    Ok(())
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
