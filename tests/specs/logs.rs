// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::support;

#[tokio::test]
async fn worker_batches_come_back_in_sequence_order() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let run_id = server.create_run("chatty", &[]).await;
    server.poll(&worker).await;

    let (status, body) = server
        .post_json(
            &format!("/workers/runs/{run_id}/logs"),
            serde_json::json!({ "lines": [
                { "stream": "stdout", "line": "starting", "sequence": 1 },
                { "stream": "stderr", "line": "careful", "sequence": 2 },
            ]}),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::OK, "{body}");
    assert_eq!(body["appended"], 2);

    // First batch moved the run to running.
    let run = server.get_json(&format!("/runs/{run_id}")).await;
    assert_eq!(run["status"], "running");

    server
        .post_json(
            &format!("/workers/runs/{run_id}/logs"),
            serde_json::json!({ "lines": [
                { "stream": "stdout", "line": "done", "sequence": 3 },
            ]}),
        )
        .await;

    let logs = server.get_json(&format!("/runs/{run_id}/logs")).await;
    let sequences: Vec<i64> =
        logs.as_array().expect("array").iter().map(|l| l["sequence"].as_i64().unwrap_or(0)).collect();
    assert_eq!(sequences, vec![1, 2, 3]);

    let tail = server.get_json(&format!("/runs/{run_id}/logs?after=2")).await;
    assert_eq!(tail.as_array().map(Vec::len), Some(1));
    assert_eq!(tail[0]["line"], "done");
}

#[tokio::test]
async fn uploaded_artifacts_are_listed_and_downloadable() {
    let server = support::start().await;
    let worker = server.register_worker("w", &[]).await;
    let run_id = server.create_run("producer", &[]).await;
    server.poll(&worker).await;

    let part = reqwest::multipart::Part::bytes(b"result data".to_vec())
        .file_name("result.txt")
        .mime_str("text/plain")
        .expect("part");
    let form = reqwest::multipart::Form::new().part("file", part);
    let response = server
        .request(reqwest::Method::POST, &format!("/workers/runs/{run_id}/artifacts"))
        .multipart(form)
        .send()
        .await
        .expect("upload");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let artifacts = server.get_json(&format!("/runs/{run_id}/artifacts")).await;
    assert_eq!(artifacts.as_array().map(Vec::len), Some(1));
    assert_eq!(artifacts[0]["filename"], "result.txt");
    assert_eq!(artifacts[0]["size_bytes"], 11);
    let artifact_id = artifacts[0]["id"].as_str().expect("artifact id");

    let response = server
        .request(
            reqwest::Method::GET,
            &format!("/runs/{run_id}/artifacts/{artifact_id}"),
        )
        .send()
        .await
        .expect("download");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.bytes().await.expect("bytes").as_ref(), b"result data");
}

#[tokio::test]
async fn metrics_reflect_queue_depth() {
    let server = support::start().await;
    server.create_run("queued-1", &[]).await;
    server.create_run("queued-2", &[]).await;

    let metrics = server.get_json("/system/metrics").await;
    assert_eq!(metrics["queue_depth"], 2);
    assert_eq!(metrics["runs"]["queued"], 2);
}
