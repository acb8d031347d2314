// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the server. All knobs use
//! the `ORCH_` prefix.

use chrono::Duration;
use std::path::PathBuf;

/// Database URL (`ORCH_DATABASE_URL`), default on-disk SQLite.
pub fn database_url() -> String {
    std::env::var("ORCH_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/orchestrator.db".to_string())
}

/// Symmetric master key for the credential box (`ORCH_MASTER_KEY`).
/// Empty means credentials cannot be sealed or opened.
pub fn master_key() -> String {
    std::env::var("ORCH_MASTER_KEY").unwrap_or_default()
}

/// Bootstrap admin API key (`ORCH_DEFAULT_ADMIN_KEY`).
pub fn default_admin_key() -> String {
    std::env::var("ORCH_DEFAULT_ADMIN_KEY").unwrap_or_else(|_| "admin".to_string())
}

pub fn server_host() -> String {
    std::env::var("ORCH_SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
}

pub fn server_port() -> u16 {
    std::env::var("ORCH_SERVER_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8080)
}

/// Seconds before a silent worker is considered dead
/// (`ORCH_WORKER_HEARTBEAT_TIMEOUT`, default 90).
pub fn worker_heartbeat_timeout() -> Duration {
    let secs = std::env::var("ORCH_WORKER_HEARTBEAT_TIMEOUT")
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(90);
    Duration::seconds(secs)
}

pub fn artifact_storage_path() -> PathBuf {
    std::env::var("ORCH_ARTIFACT_STORAGE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/artifacts"))
}

pub fn skill_storage_path() -> PathBuf {
    std::env::var("ORCH_SKILL_STORAGE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/skills"))
}

/// Tracing filter directive (`ORCH_LOG_LEVEL`, default `info`).
pub fn log_level() -> String {
    std::env::var("ORCH_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// Immutable snapshot of the server configuration, resolved once at
/// startup and shared through [`crate::AppState`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub master_key: String,
    pub default_admin_key: String,
    pub host: String,
    pub port: u16,
    pub worker_heartbeat_timeout: Duration,
    pub artifact_storage_path: PathBuf,
    pub skill_storage_path: PathBuf,
}

impl ServerConfig {
    pub fn load() -> Self {
        Self {
            database_url: database_url(),
            master_key: master_key(),
            default_admin_key: default_admin_key(),
            host: server_host(),
            port: server_port(),
            worker_heartbeat_timeout: worker_heartbeat_timeout(),
            artifact_storage_path: artifact_storage_path(),
            skill_storage_path: skill_storage_path(),
        }
    }
}
