// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler: a single cooperative ticker advancing due schedules

use crate::cron_expr;
use crate::error::ApiError;
use crate::lifecycle;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use fc_core::Clock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const TICK_INTERVAL: Duration = Duration::from_secs(30);

/// Recompute `next_run_at` for every enabled schedule. Runs once at
/// startup so downtime never causes a thundering herd of missed fires —
/// missed ticks are dropped, not backfilled.
pub async fn initialize(state: &AppState, now: DateTime<Utc>) -> Result<usize, ApiError> {
    let schedules = fc_storage::schedules::list_enabled(state.db.pool()).await?;
    let count = schedules.len();
    for schedule in schedules {
        let next = cron_expr::next_fire(&schedule.cron_expression, now).unwrap_or(None);
        fc_storage::schedules::set_next_run_at(state.db.pool(), &schedule.id, next, now).await?;
    }
    tracing::info!(schedules = count, "initialized next_run_at for enabled schedules");
    Ok(count)
}

/// One pass: fire every enabled schedule whose `next_run_at` has elapsed.
///
/// `next_run_at` advances past `now` even when the trigger fails, so a
/// broken job definition cannot produce a tight retry loop. Returns how
/// many runs were created.
pub async fn tick(state: &AppState, now: DateTime<Utc>) -> Result<u32, ApiError> {
    let due = fc_storage::schedules::due(state.db.pool(), now).await?;
    let mut fired = 0;
    for schedule in due {
        let next = cron_expr::next_fire(&schedule.cron_expression, now).unwrap_or(None);
        match lifecycle::trigger_run(
            state,
            &schedule.job_definition_id,
            &schedule.workspace_id,
            now,
        )
        .await
        {
            Ok(run) => {
                fc_storage::schedules::mark_fired(state.db.pool(), &schedule.id, now, &run.id, next)
                    .await?;
                tracing::info!(
                    schedule = %schedule.id,
                    run = %run.id,
                    job = %schedule.job_definition_id,
                    next_run_at = ?next,
                    "schedule fired"
                );
                fired += 1;
            }
            Err(err) => {
                tracing::error!(
                    schedule = %schedule.id,
                    job = %schedule.job_definition_id,
                    error = %err,
                    "schedule failed to fire"
                );
                fc_storage::schedules::set_next_run_at(state.db.pool(), &schedule.id, next, now)
                    .await?;
            }
        }
    }
    Ok(fired)
}

/// Background loop. Ticks are serialised by this single task; transient
/// errors are logged and the loop survives. Shutdown lets an in-flight
/// tick finish.
pub async fn run<C: Clock>(state: AppState, clock: C, shutdown: CancellationToken) {
    tracing::info!(interval_secs = TICK_INTERVAL.as_secs(), "scheduler starting");
    if let Err(err) = initialize(&state, clock.now_utc()).await {
        tracing::error!(error = %err, "scheduler initialization failed");
    }
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(TICK_INTERVAL) => {}
        }
        if let Err(err) = tick(&state, clock.now_utc()).await {
            tracing::error!(error = %err, "scheduler tick error");
        }
    }
    tracing::info!("scheduler stopped");
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
