// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log pipeline: durable rows, artifact-transcript fallback, SSE fan-out
//!
//! Durable storage is the `job_logs` table. Runs recorded only as a
//! `run-output.log` artifact (the transcript workers upload on completion)
//! stay readable through the same `get_logs` interface: sequences are
//! synthesised from line position and the `[stdout] `/`[stderr] ` prefix
//! is parsed, defaulting to stdout.

use crate::error::ApiError;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use fc_api::LogLine;
use fc_core::{JobLog, LogStream, RunId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Capacity of each subscriber queue. Slow consumers drop lines rather
/// than backpressure the worker's POST.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// Transcript artifact filename workers upload at completion.
pub const TRANSCRIPT_FILENAME: &str = "run-output.log";

/// Process-local registry of live SSE subscribers per run.
#[derive(Clone, Default)]
pub struct LogRegistry {
    inner: Arc<Mutex<HashMap<RunId, Vec<mpsc::Sender<LogLine>>>>>,
}

impl LogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bounded queue for a run's live log stream. Dropping the
    /// receiver unsubscribes; closed senders are pruned on publish.
    pub fn subscribe(&self, run_id: RunId) -> mpsc::Receiver<LogLine> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        self.inner.lock().entry(run_id).or_default().push(tx);
        rx
    }

    /// Best-effort fan-out. Full queues drop the line for that subscriber.
    pub fn publish(&self, run_id: &RunId, lines: &[LogLine]) {
        let mut registry = self.inner.lock();
        let Some(senders) = registry.get_mut(run_id.as_str()) else {
            return;
        };
        senders.retain(|tx| !tx.is_closed());
        for tx in senders.iter() {
            for line in lines {
                let _ = tx.try_send(line.clone());
            }
        }
        if senders.is_empty() {
            registry.remove(run_id.as_str());
        }
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self, run_id: &RunId) -> usize {
        self.inner.lock().get(run_id.as_str()).map(|s| s.len()).unwrap_or(0)
    }
}

/// Accept a worker's log batch: persist rows, advance `assigned → running`
/// on first contact, and fan out to live subscribers.
pub async fn append_logs(
    state: &AppState,
    run_id: &RunId,
    lines: &[LogLine],
    now: DateTime<Utc>,
) -> Result<usize, ApiError> {
    fc_storage::logs::append(state.db.pool(), run_id, lines).await?;
    fc_storage::runs::mark_running(state.db.pool(), run_id, now).await?;
    state.subscribers.publish(run_id, lines);
    Ok(lines.len())
}

/// Ordered tail with `sequence > after`, from rows or the transcript
/// artifact.
pub async fn get_logs(
    state: &AppState,
    run_id: &RunId,
    after: i64,
) -> Result<Vec<JobLog>, ApiError> {
    if fc_storage::logs::has_any(state.db.pool(), run_id).await? {
        return Ok(fc_storage::logs::read_after(state.db.pool(), run_id, after).await?);
    }

    let Some(artifact) =
        fc_storage::artifacts::get_by_filename(state.db.pool(), run_id, TRANSCRIPT_FILENAME)
            .await?
    else {
        return Ok(Vec::new());
    };
    let data = state
        .artifacts
        .read(&artifact.storage_path)
        .await
        .map_err(|err| ApiError::Internal(format!("read transcript: {err}")))?;
    let text = String::from_utf8_lossy(&data);
    Ok(parse_transcript(run_id.clone(), &text, after))
}

/// Parse a `run-output.log` transcript into log entries with 1-based
/// synthesised sequences.
pub fn parse_transcript(run_id: RunId, text: &str, after: i64) -> Vec<JobLog> {
    text.lines()
        .enumerate()
        .map(|(idx, raw)| {
            let sequence = idx as i64 + 1;
            let (stream, line) = split_prefix(raw);
            JobLog { run_id: run_id.clone(), sequence, stream, line: line.to_string() }
        })
        .filter(|entry| entry.sequence > after)
        .collect()
}

fn split_prefix(raw: &str) -> (LogStream, &str) {
    if let Some(rest) = raw.strip_prefix("[stdout] ") {
        (LogStream::Stdout, rest)
    } else if let Some(rest) = raw.strip_prefix("[stderr] ") {
        (LogStream::Stderr, rest)
    } else {
        (LogStream::Stdout, raw)
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
