// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for server service tests

use crate::config::ServerConfig;
use crate::state::AppState;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fc_core::{
    JobDefinition, JobId, JobRun, Labels, SkillSelection, Worker, WorkerId, WorkerStatus,
    WorkspaceId,
};
use fc_storage::{principals, Db};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap()
}

/// In-memory state with seeded defaults and temp-dir stores. The tempdir
/// must outlive the state.
pub(crate) async fn state() -> (AppState, tempfile::TempDir) {
    let db = Db::in_memory().await.unwrap();
    principals::ensure_defaults(db.pool(), t0()).await.unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        master_key: "test-master-key".to_string(),
        default_admin_key: "admin".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        worker_heartbeat_timeout: Duration::seconds(90),
        artifact_storage_path: tmp.path().join("artifacts"),
        skill_storage_path: tmp.path().join("skills"),
    };
    (AppState::new(db, config), tmp)
}

pub(crate) fn labels(pairs: &[(&str, &str)]) -> Labels {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

pub(crate) async fn insert_worker(
    state: &AppState,
    workspace: &str,
    label_pairs: &[(&str, &str)],
) -> Worker {
    let worker = Worker {
        id: WorkerId::new(),
        workspace_id: WorkspaceId::from_string(workspace),
        name: "test-worker".to_string(),
        status: WorkerStatus::Online,
        labels: labels(label_pairs),
        last_heartbeat: t0(),
        current_run_id: None,
        created_at: t0(),
        updated_at: t0(),
    };
    fc_storage::workers::insert(state.db.pool(), &worker).await.unwrap();
    worker
}

pub(crate) fn job_definition(workspace: &str, name: &str) -> JobDefinition {
    JobDefinition {
        id: JobId::new(),
        workspace_id: WorkspaceId::from_string(workspace),
        name: name.to_string(),
        description: None,
        task_prompt: "do the thing".to_string(),
        agent_type: "goose".to_string(),
        agent_config: serde_json::Map::new(),
        mcp_servers: Vec::new(),
        env_vars: Default::default(),
        credential_ids: Vec::new(),
        labels: Labels::new(),
        skill_ids: SkillSelection::none(),
        timeout_seconds: 1800,
        max_retries: 0,
        retry_backoff_seconds: 60,
        webhook_url: None,
        webhook_secret: None,
        created_at: t0(),
        updated_at: t0(),
    }
}

/// Insert a queued run snapshotted from an inline definition.
pub(crate) async fn insert_queued_run(
    state: &AppState,
    workspace: &str,
    name: &str,
    required: &[(&str, &str)],
) -> JobRun {
    let mut job = job_definition(workspace, name);
    job.labels = labels(required);
    let run = JobRun::from_definition(&job, t0());
    fc_storage::runs::insert(state.db.pool(), &run).await.unwrap();
    run
}
