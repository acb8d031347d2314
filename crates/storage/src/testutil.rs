// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for repository tests

use crate::Db;
use chrono::{DateTime, TimeZone, Utc};
use fc_core::{JobRun, RunStatus, SkillSelection, Worker, WorkerId, WorkerStatus, WorkspaceId};

pub(crate) async fn db() -> Db {
    match Db::in_memory().await {
        Ok(db) => db,
        Err(err) => panic!("in-memory db: {err}"),
    }
}

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).single().unwrap()
}

pub(crate) fn queued_run(workspace: &str, name: &str, created_at: DateTime<Utc>) -> JobRun {
    JobRun {
        id: fc_core::RunId::new(),
        workspace_id: WorkspaceId::from_string(workspace),
        job_definition_id: None,
        status: RunStatus::Queued,
        worker_id: None,
        name: name.to_string(),
        task_prompt: "do the thing".to_string(),
        agent_type: "goose".to_string(),
        agent_config: serde_json::Map::new(),
        mcp_servers: Vec::new(),
        env_vars: Default::default(),
        credential_ids: Vec::new(),
        required_labels: Default::default(),
        skill_ids: SkillSelection::none(),
        timeout_seconds: 1800,
        max_retries: 0,
        retry_backoff_seconds: 60,
        attempt_number: 1,
        parent_run_id: None,
        webhook_url: None,
        webhook_secret: None,
        scheduled_at: None,
        started_at: None,
        completed_at: None,
        result: None,
        exit_code: None,
        created_at,
        updated_at: created_at,
    }
}

pub(crate) fn online_worker(workspace: &str, labels: &[(&str, &str)]) -> Worker {
    Worker {
        id: WorkerId::new(),
        workspace_id: WorkspaceId::from_string(workspace),
        name: "test-worker".to_string(),
        status: WorkerStatus::Online,
        labels: labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        last_heartbeat: t0(),
        current_run_id: None,
        created_at: t0(),
        updated_at: t0(),
    }
}
