// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run execution: stage, stream, report

use crate::agent::{self, AgentExit};
use crate::client::ServerClient;
use crate::skills;
use crate::streamer::LogStreamer;
use fc_api::{CompleteRequest, DispatchEnvelope};
use fc_core::{LogStream, RunStatus, WorkerId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Execute one dispatched run end to end: work dir, skills, agent
/// subprocess with live log streaming, transcript artifact, completion
/// report. Never propagates execution failures — the run's terminal
/// status carries them instead.
pub async fn execute_run(
    client: Arc<ServerClient>,
    worker_id: &WorkerId,
    envelope: DispatchEnvelope,
    cancel: CancellationToken,
    log_batch_interval: Duration,
) {
    let run_id = envelope.run_id.clone();
    tracing::info!(run = %run_id, name = %envelope.name, "starting run");

    let work_dir = std::env::temp_dir().join(format!("fc-{}", run_id));
    if let Err(err) = std::fs::create_dir_all(&work_dir) {
        report(&client, worker_id, &envelope, RunStatus::Failed, Some(err.to_string()), Some(-1))
            .await;
        return;
    }

    if let Err(err) = skills::stage_skills(&client, &envelope.skills, &work_dir).await {
        tracing::warn!(run = %run_id, error = %err, "skill staging failed");
    }

    let streamer = Arc::new(LogStreamer::new((*client).clone(), run_id.clone()));
    let flush_cancel = CancellationToken::new();
    let flush_task = {
        let streamer = Arc::clone(&streamer);
        let flush_cancel = flush_cancel.clone();
        tokio::spawn(async move {
            streamer.run_flush_loop(log_batch_interval, flush_cancel).await;
        })
    };

    let (tx, mut rx) = mpsc::channel::<(LogStream, String)>(256);
    let mut transcript: Vec<(LogStream, String)> = Vec::new();

    let agent_task = {
        let envelope = envelope.clone();
        let work_dir = work_dir.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { agent::run_agent(&envelope, &work_dir, tx, cancel).await })
    };

    while let Some((stream, line)) = rx.recv().await {
        streamer.add_line(stream, line.clone()).await;
        transcript.push((stream, line));
    }

    let exit = match agent_task.await {
        Ok(exit) => exit,
        Err(err) => {
            tracing::error!(run = %run_id, error = %err, "agent task panicked");
            AgentExit::Exited(-1)
        }
    };

    // Stop the periodic flusher, then push whatever is left.
    flush_cancel.cancel();
    let _ = flush_task.await;
    let _ = streamer.flush().await;

    upload_transcript(&client, &envelope, &transcript).await;

    let (status, result) = match exit {
        AgentExit::Exited(0) => (RunStatus::Completed, None),
        AgentExit::Exited(_) => (RunStatus::Failed, None),
        AgentExit::TimedOut => (RunStatus::Timeout, Some("agent timed out".to_string())),
        AgentExit::Cancelled => (RunStatus::Cancelled, Some("cancelled".to_string())),
    };
    report(&client, worker_id, &envelope, status, result, Some(exit.exit_code())).await;

    if let Err(err) = std::fs::remove_dir_all(&work_dir) {
        tracing::debug!(run = %run_id, error = %err, "work dir cleanup failed");
    }
    tracing::info!(run = %run_id, status = %status_str(exit), "run finished");
}

fn status_str(exit: AgentExit) -> &'static str {
    match exit {
        AgentExit::Exited(0) => "completed",
        AgentExit::Exited(_) => "failed",
        AgentExit::TimedOut => "timeout",
        AgentExit::Cancelled => "cancelled",
    }
}

/// Upload the full transcript as the `run-output.log` artifact, lines
/// prefixed `[stdout] ` / `[stderr] `.
async fn upload_transcript(
    client: &ServerClient,
    envelope: &DispatchEnvelope,
    transcript: &[(LogStream, String)],
) {
    if transcript.is_empty() {
        return;
    }
    let mut body = String::new();
    for (stream, line) in transcript {
        body.push('[');
        body.push_str(stream.as_str());
        body.push_str("] ");
        body.push_str(line);
        body.push('\n');
    }
    if let Err(err) = client
        .upload_artifact(&envelope.run_id, "run-output.log", "text/plain", body.into_bytes())
        .await
    {
        tracing::warn!(run = %envelope.run_id, error = %err, "transcript upload failed");
    }
}

async fn report(
    client: &ServerClient,
    worker_id: &WorkerId,
    envelope: &DispatchEnvelope,
    status: RunStatus,
    result: Option<String>,
    exit_code: Option<i64>,
) {
    let request = CompleteRequest { status, result, exit_code };
    if let Err(err) = client.complete_run(&envelope.run_id, worker_id, request).await {
        tracing::error!(run = %envelope.run_id, error = %err, "failed to report completion");
    }
}
