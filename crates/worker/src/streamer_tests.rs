// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::client::WorkerError;
use crate::streamer::{LogSink, LogStreamer};
use fc_api::LogLine;
use fc_core::{LogStream, RunId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sink that records delivered batches and can be toggled to fail.
#[derive(Clone, Default)]
struct FakeSink {
    failing: Arc<AtomicBool>,
    delivered: Arc<Mutex<Vec<Vec<LogLine>>>>,
}

impl FakeSink {
    fn fail(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn delivered_sequences(&self) -> Vec<i64> {
        self.delivered.lock().iter().flatten().map(|l| l.sequence).collect()
    }
}

#[async_trait::async_trait]
impl LogSink for FakeSink {
    async fn post(&self, _run_id: &RunId, lines: Vec<LogLine>) -> Result<(), WorkerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(WorkerError::Server {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                detail: "boom".to_string(),
            });
        }
        self.delivered.lock().push(lines);
        Ok(())
    }
}

#[tokio::test]
async fn sequences_start_at_one_and_increase() {
    let sink = FakeSink::default();
    let streamer = LogStreamer::new(sink.clone(), RunId::new());
    streamer.add_line(LogStream::Stdout, "a").await;
    streamer.add_line(LogStream::Stderr, "b").await;
    streamer.add_line(LogStream::Stdout, "c").await;
    streamer.flush().await.unwrap();
    assert_eq!(sink.delivered_sequences(), vec![1, 2, 3]);
}

#[tokio::test]
async fn flush_of_empty_buffer_is_a_noop() {
    let sink = FakeSink::default();
    let streamer = LogStreamer::new(sink.clone(), RunId::new());
    streamer.flush().await.unwrap();
    assert!(sink.delivered_sequences().is_empty());
}

#[tokio::test]
async fn failed_flush_re_enqueues_in_order() {
    let sink = FakeSink::default();
    let streamer = LogStreamer::new(sink.clone(), RunId::new());
    streamer.add_line(LogStream::Stdout, "one").await;
    streamer.add_line(LogStream::Stdout, "two").await;

    sink.fail(true);
    assert!(streamer.flush().await.is_err());
    // Lines written during the outage land behind the retried batch.
    streamer.add_line(LogStream::Stdout, "three").await;
    assert_eq!(streamer.pending().await, vec![1, 2, 3]);

    sink.fail(false);
    streamer.flush().await.unwrap();
    assert_eq!(sink.delivered_sequences(), vec![1, 2, 3]);
    assert!(streamer.pending().await.is_empty());
}

#[tokio::test]
async fn retried_batches_stay_monotonic_across_multiple_failures() {
    let sink = FakeSink::default();
    let streamer = LogStreamer::new(sink.clone(), RunId::new());

    sink.fail(true);
    for i in 0..5 {
        streamer.add_line(LogStream::Stdout, format!("line {i}")).await;
        let _ = streamer.flush().await;
    }
    sink.fail(false);
    streamer.flush().await.unwrap();

    let sequences = sink.delivered_sequences();
    assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
}
