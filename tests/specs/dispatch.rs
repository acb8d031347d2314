// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::support;

#[tokio::test]
async fn two_workers_one_run_exactly_one_wins() {
    let server = support::start().await;
    let w1 = server.register_worker("w1", &[]).await;
    let w2 = server.register_worker("w2", &[]).await;
    let run_id = server.create_run("contested", &[]).await;

    let (a, b) = tokio::join!(server.poll(&w1), server.poll(&w2));
    let envelopes = [a, b];
    let wins = envelopes.iter().filter(|v| !v.is_null()).count();
    assert_eq!(wins, 1, "exactly one poll must win: {envelopes:?}");
    let winner = envelopes.iter().find(|v| !v.is_null()).expect("winner");
    assert_eq!(winner["run_id"], run_id.as_str());

    let run = server.get_json(&format!("/runs/{run_id}")).await;
    assert_eq!(run["status"], "assigned");
    let assigned_worker = run["worker_id"].as_str().expect("worker id");
    assert!(assigned_worker == w1 || assigned_worker == w2);
}

#[tokio::test]
async fn gpu_routing_matches_label_subsets() {
    let server = support::start().await;
    let w_gpu = server.register_worker("w-gpu", &[("gpu", "true")]).await;
    let w_cpu = server.register_worker("w-cpu", &[("gpu", "false")]).await;
    server.create_run("tpu-run", &[("tpu", "true")]).await;
    let gpu_run = server.create_run("gpu-run", &[("gpu", "true")]).await;

    let envelope = server.poll(&w_gpu).await;
    assert_eq!(envelope["run_id"], gpu_run.as_str());
    assert!(server.poll(&w_cpu).await.is_null());
}

#[tokio::test]
async fn unlabelled_runs_go_to_anyone_in_fifo_order() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[("zone", "eu")]).await;
    let first = server.create_run("first", &[]).await;
    let second = server.create_run("second", &[]).await;

    assert_eq!(server.poll(&worker).await["run_id"], first.as_str());
    // Worker is busy; the queue still holds the second run.
    let runs = server.get_json("/runs?status=queued").await;
    assert_eq!(runs.as_array().map(Vec::len), Some(1));
    assert_eq!(runs[0]["id"], second.as_str());
}

#[tokio::test]
async fn envelope_carries_the_run_snapshot() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let (status, body) = server
        .post_json(
            "/runs",
            serde_json::json!({
                "name": "snapshot",
                "task_prompt": "review the PR",
                "agent_config": { "provider": "anthropic", "model": "claude-sonnet-4-5" },
                "env_vars": { "CI": "1" },
                "timeout_seconds": 900,
                "skill_ids": [],
            }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{body}");

    let envelope = server.poll(&worker).await;
    assert_eq!(envelope["name"], "snapshot");
    assert_eq!(envelope["task_prompt"], "review the PR");
    assert_eq!(envelope["timeout_seconds"], 900);
    assert_eq!(envelope["env_vars"]["CI"], "1");
    assert_eq!(envelope["agent_config"]["provider"], "anthropic");
    assert!(envelope["skills"].as_array().map(Vec::is_empty).unwrap_or(false));
}
