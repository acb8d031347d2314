// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::support;

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let server = support::start().await;
    let response = server
        .http
        .get(format!("{}/runs", server.base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let server = support::start().await;
    let response = server
        .http
        .get(format!("{}/runs", server.base))
        .bearer_auth("not-a-key")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_membership_is_forbidden() {
    let server = support::start().await;
    let response = server
        .http
        .get(format!("{}/runs", server.base))
        .bearer_auth(support::ADMIN_KEY)
        .header("X-Workspace-ID", "nonexistent")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn health_needs_no_auth() {
    let server = support::start().await;
    let response = server
        .http
        .get(format!("{}/health", server.base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn workers_never_see_runs_from_other_workspaces() {
    let server = support::start().await;

    // Admin creates a second workspace (becoming its owner).
    let (status, workspace) = server
        .post_json(
            "/workspaces",
            serde_json::json!({ "name": "Research", "slug": "research" }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{workspace}");
    let workspace_id = workspace["id"].as_str().expect("workspace id");

    // A run queued in the new workspace…
    let response = server
        .http
        .post(format!("{}/runs", server.base))
        .bearer_auth(support::ADMIN_KEY)
        .header("X-Workspace-ID", workspace_id)
        .json(&serde_json::json!({ "name": "foreign", "task_prompt": "secret", "skill_ids": [] }))
        .send()
        .await
        .expect("create run");
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    // …is invisible to a worker registered in `default`.
    let worker = server.register_worker("w-default", &[]).await;
    assert!(server.poll(&worker).await.is_null());

    // And invisible to reads scoped to `default`.
    let runs = server.get_json("/runs").await;
    assert!(runs.as_array().map(Vec::is_empty).unwrap_or(false));
}

#[tokio::test]
async fn users_me_reflects_the_authenticated_principal() {
    let server = support::start().await;
    let me = server.get_json("/users/me").await;
    assert_eq!(me["username"], "admin");
}
