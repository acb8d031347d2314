// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared application state threaded through handlers and background tasks

use crate::config::ServerConfig;
use crate::logs::LogRegistry;
use crate::store::LocalStore;
use crate::vault::Vault;
use fc_storage::Db;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub vault: Vault,
    pub artifacts: LocalStore,
    pub skills: LocalStore,
    pub subscribers: LogRegistry,
    /// Outbound client for webhook delivery (30 s timeout).
    pub http: reqwest::Client,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Db, config: ServerConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("FlightControl-Webhook/1.0")
            .build()
            .unwrap_or_default();
        Self {
            db,
            vault: Vault::new(&config.master_key),
            artifacts: LocalStore::new(&config.artifact_storage_path),
            skills: LocalStore::new(&config.skill_storage_path),
            subscribers: LogRegistry::new(),
            http,
            config: Arc::new(config),
        }
    }
}
