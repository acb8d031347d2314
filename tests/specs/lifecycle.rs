// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::support;
use chrono::{DateTime, Duration, Utc};

#[tokio::test]
async fn cancel_before_dispatch_starves_the_poll() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let run_id = server.create_run("doomed", &[]).await;

    let (status, body) =
        server.post_json(&format!("/runs/{run_id}/cancel"), serde_json::json!({})).await;
    assert_eq!(status, reqwest::StatusCode::OK, "{body}");
    assert_eq!(body["status"], "cancelled");

    assert!(server.poll(&worker).await.is_null());
    let run = server.get_json(&format!("/runs/{run_id}")).await;
    assert_eq!(run["status"], "cancelled");
}

#[tokio::test]
async fn cancelling_a_finished_run_is_a_bad_transition() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let run_id = server.create_run("quick", &[]).await;
    server.poll(&worker).await;
    server.complete(&run_id, &worker, "completed", 0).await;

    let (status, _) =
        server.post_json(&format!("/runs/{run_id}/cancel"), serde_json::json!({})).await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn completion_frees_the_worker_for_the_next_run() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let first = server.create_run("first", &[]).await;
    let second = server.create_run("second", &[]).await;

    assert_eq!(server.poll(&worker).await["run_id"], first.as_str());
    server.complete(&first, &worker, "completed", 0).await;

    let workers = server.get_json("/system/workers").await;
    assert_eq!(workers[0]["status"], "online");
    assert!(workers[0]["current_run_id"].is_null());

    assert_eq!(server.poll(&worker).await["run_id"], second.as_str());
}

#[tokio::test]
async fn failed_run_with_retries_spawns_a_deferred_child() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;

    let (status, job) = server
        .post_json(
            "/jobs",
            serde_json::json!({
                "name": "flaky",
                "task_prompt": "try hard",
                "max_retries": 2,
                "retry_backoff_seconds": 60,
                "skill_ids": [],
            }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{job}");
    let job_id = job["id"].as_str().expect("job id");

    let (status, run) =
        server.post_json(&format!("/jobs/{job_id}/run"), serde_json::json!({})).await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{run}");
    let run_id = run["id"].as_str().expect("run id").to_string();

    let before = Utc::now();
    server.poll(&worker).await;
    server.complete(&run_id, &worker, "failed", 1).await;

    let queued = server.get_json("/runs?status=queued").await;
    assert_eq!(queued.as_array().map(Vec::len), Some(1));
    let child = &queued[0];
    assert_eq!(child["attempt_number"], 2);
    assert_eq!(child["parent_run_id"], run_id.as_str());
    let scheduled_at: DateTime<Utc> =
        child["scheduled_at"].as_str().expect("scheduled_at").parse().expect("rfc3339");
    let delay = scheduled_at - before;
    assert!(delay >= Duration::seconds(59) && delay <= Duration::seconds(120), "delay {delay}");

    // The child is not dispatchable until the backoff elapses.
    assert!(server.poll(&worker).await.is_null());
}

#[tokio::test]
async fn worker_report_after_cancel_is_ignored() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let run_id = server.create_run("raced", &[]).await;
    server.poll(&worker).await;

    let (status, _) =
        server.post_json(&format!("/runs/{run_id}/cancel"), serde_json::json!({})).await;
    assert_eq!(status, reqwest::StatusCode::OK);

    let body = server.complete(&run_id, &worker, "completed", 0).await;
    assert_eq!(body["status"], "cancelled");
    let run = server.get_json(&format!("/runs/{run_id}")).await;
    assert_eq!(run["status"], "cancelled");
}

#[tokio::test]
async fn heartbeat_surfaces_cancellation_of_the_current_run() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let run_id = server.create_run("to-cancel", &[]).await;
    server.poll(&worker).await;

    server.post_json(&format!("/runs/{run_id}/cancel"), serde_json::json!({})).await;

    let (status, body) = server
        .post_json(
            "/workers/heartbeat",
            serde_json::json!({ "worker_id": worker, "status": "busy" }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::OK, "{body}");
    assert_eq!(body["cancelled_run_id"], run_id.as_str());
}
