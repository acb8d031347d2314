// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Introspection: health, worker listing (reap-on-read), metrics

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use fc_core::Worker;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/system/workers", get(list_workers))
        .route("/system/metrics", get(metrics))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Workers listing with lazy reaping: stale workers flip to offline before
/// the read, so the list never shows a live status for a dead worker.
async fn list_workers(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<Worker>>, ApiError> {
    let now = Utc::now();
    let cutoff = now - state.config.worker_heartbeat_timeout;
    fc_storage::workers::reap_stale(state.db.pool(), cutoff, now).await?;
    Ok(Json(fc_storage::workers::list(state.db.pool(), &auth.workspace_id).await?))
}

async fn metrics(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<serde_json::Value>, ApiError> {
    // Reap first so worker counts reflect reality.
    let now = Utc::now();
    let cutoff = now - state.config.worker_heartbeat_timeout;
    fc_storage::workers::reap_stale(state.db.pool(), cutoff, now).await?;

    let runs = fc_storage::runs::count_by_status(state.db.pool(), &auth.workspace_id).await?;
    let workers = fc_storage::workers::count_by_status(state.db.pool(), &auth.workspace_id).await?;
    let queue_depth = runs.get("queued").copied().unwrap_or(0);
    Ok(Json(serde_json::json!({
        "runs": runs,
        "workers": workers,
        "queue_depth": queue_depth,
    })))
}
