// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::webhook::signature;
use fc_api::WebhookPayload;
use fc_core::{JobRun, RunStatus};
use serde_json::Value;

#[test]
fn signature_is_stable_hex_hmac() {
    let sig = signature("secret", b"payload");
    assert_eq!(sig.len(), 64);
    assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(sig, signature("secret", b"payload"));
    assert_ne!(sig, signature("other", b"payload"));
    assert_ne!(sig, signature("secret", b"different"));
}

#[test]
fn payload_carries_the_contract_fields() {
    let job = test_job();
    let mut run = JobRun::from_definition(&job, chrono::Utc::now());
    run.status = RunStatus::Completed;
    run.exit_code = Some(0);
    run.started_at = Some(chrono::Utc::now());
    run.completed_at = Some(chrono::Utc::now() + chrono::Duration::seconds(90));

    let payload = WebhookPayload::from_run(&run);
    let json: Value = serde_json::to_value(&payload).unwrap();
    for key in
        ["run_id", "job_id", "status", "exit_code", "started_at", "completed_at", "duration_seconds"]
    {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["status"], "completed");
    assert_eq!(json["duration_seconds"], 90.0);
}

fn test_job() -> fc_core::JobDefinition {
    fc_core::JobDefinition {
        id: fc_core::JobId::new(),
        workspace_id: fc_core::WorkspaceId::from_string("default"),
        name: "hooked".to_string(),
        description: None,
        task_prompt: "p".to_string(),
        agent_type: "goose".to_string(),
        agent_config: serde_json::Map::new(),
        mcp_servers: Vec::new(),
        env_vars: Default::default(),
        credential_ids: Vec::new(),
        labels: Default::default(),
        skill_ids: fc_core::SkillSelection::none(),
        timeout_seconds: 600,
        max_retries: 0,
        retry_backoff_seconds: 60,
        webhook_url: Some("http://localhost:9/hook".to_string()),
        webhook_secret: Some("s".to_string()),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}
