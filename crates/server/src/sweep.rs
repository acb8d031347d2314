// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sweep: worker heartbeat reaping and run timeouts
//!
//! Reap-on-read (the workers listing) is a convenient lazy GC but not
//! sufficient alone; this timer guarantees both checks run even on an
//! idle API.

use crate::lifecycle;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use fc_core::Clock;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// One pass: mark stale workers offline, then time out expired runs.
/// A reaped worker does not fail its run — only the run's own timeout
/// does that.
pub async fn sweep_once(state: &AppState, now: DateTime<Utc>) {
    let cutoff = now - state.config.worker_heartbeat_timeout;
    match fc_storage::workers::reap_stale(state.db.pool(), cutoff, now).await {
        Ok(0) => {}
        Ok(reaped) => tracing::info!(reaped, "marked stale workers offline"),
        Err(err) => tracing::error!(error = %err, "worker reap failed"),
    }
    match lifecycle::sweep_timeouts(state, now).await {
        Ok(0) => {}
        Ok(swept) => tracing::info!(swept, "timed out expired runs"),
        Err(err) => tracing::error!(error = %err, "timeout sweep failed"),
    }
}

/// Background loop alongside the scheduler. Errors never escape; the loop
/// must survive.
pub async fn run<C: Clock>(state: AppState, clock: C, shutdown: CancellationToken) {
    tracing::info!(interval_secs = SWEEP_INTERVAL.as_secs(), "sweeper starting");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(SWEEP_INTERVAL) => {}
        }
        sweep_once(&state, clock.now_utc()).await;
    }
    tracing::info!("sweeper stopped");
}
