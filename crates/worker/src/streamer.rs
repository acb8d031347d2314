// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log streamer: sequenced batching with order-preserving retry

use crate::client::{ServerClient, WorkerError};
use fc_api::LogLine;
use fc_core::{LogStream, RunId};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Where flushed batches go. The indirection exists so retry behaviour is
/// testable without a server.
#[async_trait::async_trait]
pub trait LogSink: Send + Sync {
    async fn post(&self, run_id: &RunId, lines: Vec<LogLine>) -> Result<(), WorkerError>;
}

#[async_trait::async_trait]
impl LogSink for ServerClient {
    async fn post(&self, run_id: &RunId, lines: Vec<LogLine>) -> Result<(), WorkerError> {
        self.post_logs(run_id, lines).await
    }
}

struct Buffer {
    queue: VecDeque<LogLine>,
    next_sequence: i64,
}

/// Buffers log lines with worker-assigned sequences and flushes them in
/// batches. A failed POST re-enqueues the batch at the front, so retried
/// lines keep their original order and sequences stay monotonic.
pub struct LogStreamer<S: LogSink> {
    sink: S,
    run_id: RunId,
    buffer: Mutex<Buffer>,
}

impl<S: LogSink> LogStreamer<S> {
    pub fn new(sink: S, run_id: RunId) -> Self {
        Self {
            sink,
            run_id,
            buffer: Mutex::new(Buffer { queue: VecDeque::new(), next_sequence: 1 }),
        }
    }

    pub async fn add_line(&self, stream: LogStream, line: impl Into<String>) {
        let mut buffer = self.buffer.lock().await;
        let sequence = buffer.next_sequence;
        buffer.next_sequence += 1;
        buffer.queue.push_back(LogLine { stream, line: line.into(), sequence });
    }

    /// Send everything buffered. On failure the batch goes back to the
    /// front of the queue, ahead of lines added meanwhile.
    pub async fn flush(&self) -> Result<(), WorkerError> {
        let batch: Vec<LogLine> = {
            let mut buffer = self.buffer.lock().await;
            if buffer.queue.is_empty() {
                return Ok(());
            }
            buffer.queue.drain(..).collect()
        };

        match self.sink.post(&self.run_id, batch.clone()).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(run = %self.run_id, error = %err, "log flush failed, re-enqueueing");
                let mut buffer = self.buffer.lock().await;
                for line in batch.into_iter().rev() {
                    buffer.queue.push_front(line);
                }
                Err(err)
            }
        }
    }

    /// Periodic flush loop; runs until cancelled. Flush errors are
    /// retried on the next tick.
    pub async fn run_flush_loop(&self, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            let _ = self.flush().await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn pending(&self) -> Vec<i64> {
        self.buffer.lock().await.queue.iter().map(|l| l.sequence).collect()
    }
}

#[cfg(test)]
#[path = "streamer_tests.rs"]
mod tests;
