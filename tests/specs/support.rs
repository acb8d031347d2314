// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test server bootstrap and HTTP helpers

use chrono::{Duration, Utc};
use fc_server::config::ServerConfig;
use fc_server::AppState;
use fc_storage::{principals, Db};
use serde_json::Value;

pub const ADMIN_KEY: &str = "admin";

pub struct TestServer {
    pub base: String,
    pub http: reqwest::Client,
    pub state: AppState,
    _tmp: tempfile::TempDir,
}

/// Boot the full router on an ephemeral port over an in-memory database.
pub async fn start() -> TestServer {
    let db = Db::in_memory().await.expect("in-memory db");
    principals::ensure_defaults(db.pool(), Utc::now()).await.expect("seed defaults");

    let tmp = tempfile::tempdir().expect("tempdir");
    let config = ServerConfig {
        database_url: "sqlite::memory:".to_string(),
        master_key: "spec-master-key".to_string(),
        default_admin_key: ADMIN_KEY.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        worker_heartbeat_timeout: Duration::seconds(90),
        artifact_storage_path: tmp.path().join("artifacts"),
        skill_storage_path: tmp.path().join("skills"),
    };
    let state = AppState::new(db, config);

    let app = fc_server::api::router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    TestServer {
        base: format!("http://{}/api/v1", addr),
        http: reqwest::Client::new(),
        state,
        _tmp: tmp,
    }
}

impl TestServer {
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base, path))
            .bearer_auth(ADMIN_KEY)
            .header("X-Workspace-ID", "default")
    }

    pub async fn get_json(&self, path: &str) -> Value {
        let response = self.request(reqwest::Method::GET, path).send().await.expect("GET");
        assert!(response.status().is_success(), "GET {path}: {}", response.status());
        response.json().await.expect("json body")
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(&body)
            .send()
            .await
            .expect("POST");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Register a worker through the API and return its id.
    pub async fn register_worker(&self, name: &str, labels: &[(&str, &str)]) -> String {
        let labels: serde_json::Map<String, Value> =
            labels.iter().map(|(k, v)| (k.to_string(), Value::String(v.to_string()))).collect();
        let (status, body) = self
            .post_json(
                "/workers/register",
                serde_json::json!({ "name": name, "labels": labels }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::CREATED, "register: {body}");
        body["id"].as_str().expect("worker id").to_string()
    }

    /// Create a queued ad-hoc run and return its id.
    pub async fn create_run(&self, name: &str, required_labels: &[(&str, &str)]) -> String {
        let labels: serde_json::Map<String, Value> = required_labels
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        let (status, body) = self
            .post_json(
                "/runs",
                serde_json::json!({
                    "name": name,
                    "task_prompt": "do the thing",
                    "required_labels": labels,
                    "skill_ids": [],
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::CREATED, "create run: {body}");
        body["id"].as_str().expect("run id").to_string()
    }

    pub async fn poll(&self, worker_id: &str) -> Value {
        let response = self
            .request(reqwest::Method::POST, "/workers/poll")
            .query(&[("worker_id", worker_id)])
            .send()
            .await
            .expect("poll");
        assert!(response.status().is_success(), "poll: {}", response.status());
        response.json().await.expect("poll body")
    }

    pub async fn complete(
        &self,
        run_id: &str,
        worker_id: &str,
        status: &str,
        exit_code: i64,
    ) -> Value {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/workers/runs/{run_id}/complete"),
            )
            .query(&[("worker_id", worker_id)])
            .json(&serde_json::json!({ "status": status, "exit_code": exit_code }))
            .send()
            .await
            .expect("complete");
        assert!(response.status().is_success(), "complete: {}", response.status());
        response.json().await.expect("complete body")
    }
}
