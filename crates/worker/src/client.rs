// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client against the control plane's `/api/v1` surface

use fc_api::{
    CompleteRequest, DispatchEnvelope, HeartbeatRequest, HeartbeatResponse, LogBatch, LogLine,
    RegisterRequest, RegisterResponse,
};
use fc_core::{Labels, RunId, SkillId, WorkerId, WorkerStatus};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {detail}")]
    Server { status: reqwest::StatusCode, detail: String },
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Bearer-authenticated, workspace-scoped client. One instance per worker
/// process; reqwest pools connections underneath.
#[derive(Clone)]
pub struct ServerClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    workspace_id: String,
}

impl ServerClient {
    pub fn new(server_url: &str, api_key: &str, workspace_id: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base: format!("{}/api/v1", server_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            workspace_id: workspace_id.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base, path))
            .bearer_auth(&self.api_key)
            .header("X-Workspace-ID", &self.workspace_id)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, WorkerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let detail = response.text().await.unwrap_or_default();
        Err(WorkerError::Server { status, detail })
    }

    pub async fn register(
        &self,
        name: &str,
        labels: Labels,
    ) -> Result<RegisterResponse, WorkerError> {
        let response = self
            .request(reqwest::Method::POST, "/workers/register")
            .json(&RegisterRequest { name: name.to_string(), labels })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn heartbeat(
        &self,
        worker_id: &WorkerId,
        status: WorkerStatus,
    ) -> Result<HeartbeatResponse, WorkerError> {
        let response = self
            .request(reqwest::Method::POST, "/workers/heartbeat")
            .json(&HeartbeatRequest { worker_id: worker_id.clone(), status })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn poll(
        &self,
        worker_id: &WorkerId,
    ) -> Result<Option<DispatchEnvelope>, WorkerError> {
        let response = self
            .request(reqwest::Method::POST, "/workers/poll")
            .query(&[("worker_id", worker_id.as_str())])
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn post_logs(&self, run_id: &RunId, lines: Vec<LogLine>) -> Result<(), WorkerError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/workers/runs/{}/logs", run_id))
            .json(&LogBatch { lines })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn upload_artifact(
        &self,
        run_id: &RunId,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<(), WorkerError> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .request(reqwest::Method::POST, &format!("/workers/runs/{}/artifacts", run_id))
            .multipart(form)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn complete_run(
        &self,
        run_id: &RunId,
        worker_id: &WorkerId,
        body: CompleteRequest,
    ) -> Result<(), WorkerError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/workers/runs/{}/complete", run_id))
            .query(&[("worker_id", worker_id.as_str())])
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn download_skill_file(
        &self,
        skill_id: &SkillId,
        file_path: &str,
    ) -> Result<Vec<u8>, WorkerError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/skills/{}/files/{}", skill_id, file_path),
            )
            .send()
            .await?;
        Ok(Self::check(response).await?.bytes().await?.to_vec())
    }
}
