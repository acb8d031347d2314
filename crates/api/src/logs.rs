// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log batches streamed from workers

use fc_core::LogStream;
use serde::{Deserialize, Serialize};

/// One log line. `sequence` is assigned by the worker and strictly
/// increases within a run; the server treats duplicate sequences as
/// last-writer-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub stream: LogStream,
    pub line: String,
    pub sequence: i64,
}

/// Body of `POST /workers/runs/{run_id}/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBatch {
    pub lines: Vec<LogLine>,
}
