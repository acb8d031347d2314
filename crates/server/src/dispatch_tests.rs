// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::dispatch;
use crate::skills::create_skill;
use crate::testutil::{insert_queued_run, insert_worker, state, t0};
use chrono::Duration;
use fc_core::skill_md::parse_skill_md;
use fc_core::{Credential, CredentialId, RunStatus, SkillSelection, WorkerId, WorkerStatus, WorkspaceId};
use fc_storage::{credentials, runs, workers};

#[tokio::test]
async fn poll_claims_the_oldest_eligible_run() {
    let (state, _tmp) = state().await;
    let worker = insert_worker(&state, "default", &[]).await;
    let first = insert_queued_run(&state, "default", "first", &[]).await;
    // Second run created later.
    let mut job = crate::testutil::job_definition("default", "second");
    job.labels = Default::default();
    let second = fc_core::JobRun::from_definition(&job, t0() + Duration::seconds(5));
    runs::insert(state.db.pool(), &second).await.unwrap();

    let envelope = dispatch::poll(&state, &worker.id, t0() + Duration::hours(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(envelope.run_id, first.id);

    let claimed = runs::get(state.db.pool(), &first.id).await.unwrap().unwrap();
    assert_eq!(claimed.status, RunStatus::Assigned);
    assert_eq!(claimed.worker_id, Some(worker.id.clone()));
    assert!(claimed.started_at.is_some());

    let worker = workers::get(state.db.pool(), &worker.id).await.unwrap().unwrap();
    assert_eq!(worker.status, WorkerStatus::Busy);
    assert_eq!(worker.current_run_id, Some(first.id));
}

#[tokio::test]
async fn poll_routes_by_label_subset() {
    let (state, _tmp) = state().await;
    let gpu_worker = insert_worker(&state, "default", &[("gpu", "true")]).await;
    let cpu_worker = insert_worker(&state, "default", &[("gpu", "false")]).await;
    insert_queued_run(&state, "default", "tpu-run", &[("tpu", "true")]).await;
    let gpu_run = insert_queued_run(&state, "default", "gpu-run", &[("gpu", "true")]).await;

    let envelope = dispatch::poll(&state, &gpu_worker.id, t0()).await.unwrap().unwrap();
    assert_eq!(envelope.run_id, gpu_run.id);
    assert!(dispatch::poll(&state, &cpu_worker.id, t0()).await.unwrap().is_none());
}

#[tokio::test]
async fn poll_never_crosses_workspaces() {
    let (state, _tmp) = state().await;
    let worker = insert_worker(&state, "default", &[]).await;
    insert_queued_run(&state, "other", "foreign", &[]).await;
    assert!(dispatch::poll(&state, &worker.id, t0()).await.unwrap().is_none());
}

#[tokio::test]
async fn poll_skips_future_scheduled_runs() {
    let (state, _tmp) = state().await;
    let worker = insert_worker(&state, "default", &[]).await;
    let mut job = crate::testutil::job_definition("default", "deferred");
    job.labels = Default::default();
    let mut run = fc_core::JobRun::from_definition(&job, t0());
    run.scheduled_at = Some(t0() + Duration::seconds(60));
    runs::insert(state.db.pool(), &run).await.unwrap();

    assert!(dispatch::poll(&state, &worker.id, t0()).await.unwrap().is_none());
    let envelope = dispatch::poll(&state, &worker.id, t0() + Duration::seconds(61))
        .await
        .unwrap();
    assert!(envelope.is_some());
}

#[tokio::test]
async fn poll_returns_none_for_unknown_worker() {
    let (state, _tmp) = state().await;
    insert_queued_run(&state, "default", "waiting", &[]).await;
    assert!(dispatch::poll(&state, &WorkerId::new(), t0()).await.unwrap().is_none());
}

#[tokio::test]
async fn envelope_resolves_credentials_and_skips_undecryptable_ones() {
    let (state, _tmp) = state().await;
    let ws = WorkspaceId::from_string("default");
    let good = Credential {
        id: CredentialId::new(),
        workspace_id: ws.clone(),
        name: "github".to_string(),
        env_var: "GITHUB_TOKEN".to_string(),
        encrypted_value: state.vault.seal("ghp_plain").unwrap(),
        description: None,
        created_at: t0(),
        updated_at: t0(),
    };
    let broken = Credential {
        id: CredentialId::new(),
        workspace_id: ws.clone(),
        name: "broken".to_string(),
        env_var: "BROKEN".to_string(),
        encrypted_value: "not-a-sealed-token".to_string(),
        description: None,
        created_at: t0(),
        updated_at: t0(),
    };
    credentials::insert(state.db.pool(), &good).await.unwrap();
    credentials::insert(state.db.pool(), &broken).await.unwrap();

    let worker = insert_worker(&state, "default", &[]).await;
    let mut job = crate::testutil::job_definition("default", "with-creds");
    job.credential_ids = vec!["github".to_string(), "broken".to_string(), "missing".to_string()];
    let run = fc_core::JobRun::from_definition(&job, t0());
    runs::insert(state.db.pool(), &run).await.unwrap();

    let envelope = dispatch::poll(&state, &worker.id, t0()).await.unwrap().unwrap();
    assert_eq!(envelope.credentials.get("GITHUB_TOKEN").map(String::as_str), Some("ghp_plain"));
    // Broken and unknown credentials are omitted, not fatal.
    assert!(!envelope.credentials.contains_key("BROKEN"));
    assert_eq!(envelope.credentials.len(), 1);
}

#[tokio::test]
async fn envelope_skill_selection_tri_state() {
    let (state, _tmp) = state().await;
    let ws = WorkspaceId::from_string("default");
    for doc in [
        "---\nname: alpha\ndescription: a\n---\nuse alpha",
        "---\nname: beta\ndescription: b\n---\nuse beta",
    ] {
        let parsed = parse_skill_md(doc).unwrap();
        create_skill(&state, &ws, &parsed, Vec::new(), t0()).await.unwrap();
    }

    let worker = insert_worker(&state, "default", &[]).await;

    // null → all workspace skills, with file manifests attached.
    let mut job = crate::testutil::job_definition("default", "all-skills");
    job.skill_ids = SkillSelection::All;
    let run = fc_core::JobRun::from_definition(&job, t0());
    runs::insert(state.db.pool(), &run).await.unwrap();
    let envelope = dispatch::poll(&state, &worker.id, t0()).await.unwrap().unwrap();
    assert_eq!(envelope.skills.len(), 2);
    assert!(envelope.skills.iter().all(|s| !s.files.is_empty()));
    assert!(envelope.skills[0].files[0].checksum_sha256.len() == 64);

    // Named set → exactly those skills.
    fc_storage::workers::free(state.db.pool(), &worker.id, &run.id, t0()).await.unwrap();
    let mut job = crate::testutil::job_definition("default", "one-skill");
    job.skill_ids = SkillSelection::Named(vec!["beta".to_string()]);
    let run = fc_core::JobRun::from_definition(&job, t0());
    runs::insert(state.db.pool(), &run).await.unwrap();
    let envelope = dispatch::poll(&state, &worker.id, t0()).await.unwrap().unwrap();
    assert_eq!(envelope.skills.len(), 1);
    assert_eq!(envelope.skills[0].name, "beta");

    // Empty list → none.
    fc_storage::workers::free(state.db.pool(), &worker.id, &run.id, t0()).await.unwrap();
    let mut job = crate::testutil::job_definition("default", "no-skills");
    job.skill_ids = SkillSelection::none();
    let run = fc_core::JobRun::from_definition(&job, t0());
    runs::insert(state.db.pool(), &run).await.unwrap();
    let envelope = dispatch::poll(&state, &worker.id, t0()).await.unwrap().unwrap();
    assert!(envelope.skills.is_empty());
}
