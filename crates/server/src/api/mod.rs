// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP surface: thin routers over the services, prefixed `/api/v1`

pub mod credentials;
pub mod jobs;
pub mod runs;
pub mod schedules;
pub mod skills;
pub mod system;
pub mod workers;
pub mod workspaces;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;

/// Skill zips may reach 50 MiB extracted; leave headroom over the default
/// 2 MiB body cap.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(jobs::router())
        .merge(runs::router())
        .merge(workers::router())
        .merge(credentials::router())
        .merge(skills::router())
        .merge(schedules::router())
        .merge(system::router())
        .merge(workspaces::router())
}
