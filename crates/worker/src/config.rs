// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the worker. All knobs use
//! the `ORCH_` prefix.

use std::time::Duration;

pub fn server_url() -> String {
    std::env::var("ORCH_SERVER_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

pub fn api_key() -> String {
    std::env::var("ORCH_API_KEY").unwrap_or_else(|_| "admin".to_string())
}

pub fn workspace_id() -> String {
    std::env::var("ORCH_WORKSPACE_ID").unwrap_or_else(|_| "default".to_string())
}

/// Worker name (`ORCH_WORKER_NAME`), defaulting to `worker-{hostname}`.
pub fn worker_name() -> String {
    if let Ok(name) = std::env::var("ORCH_WORKER_NAME") {
        if !name.is_empty() {
            return name;
        }
    }
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    format!("worker-{host}")
}

/// Routing labels as CSV `k=v` pairs (`ORCH_LABELS`).
pub fn labels_csv() -> String {
    std::env::var("ORCH_LABELS").unwrap_or_default()
}

fn duration_env(key: &str, default_secs: u64) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(default_secs))
}

pub fn poll_interval() -> Duration {
    duration_env("ORCH_POLL_INTERVAL", 5)
}

pub fn heartbeat_interval() -> Duration {
    duration_env("ORCH_HEARTBEAT_INTERVAL", 30)
}

pub fn log_batch_interval() -> Duration {
    duration_env("ORCH_LOG_BATCH_INTERVAL", 2)
}

pub fn log_level() -> String {
    std::env::var("ORCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}
