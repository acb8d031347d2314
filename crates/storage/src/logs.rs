// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable log rows. `INSERT OR REPLACE` on `(run_id, sequence)` makes
//! retried batches last-writer-wins per sequence.

use crate::StorageError;
use fc_api::LogLine;
use fc_core::{JobLog, RunId};
use sqlx::{Row, SqlitePool};

pub async fn append(
    pool: &SqlitePool,
    run_id: &RunId,
    lines: &[LogLine],
) -> Result<(), StorageError> {
    if lines.is_empty() {
        return Ok(());
    }
    let mut tx = pool.begin().await?;
    for line in lines {
        sqlx::query(
            "INSERT OR REPLACE INTO job_logs (run_id, sequence, stream, line) VALUES (?, ?, ?, ?)",
        )
        .bind(run_id.as_str())
        .bind(line.sequence)
        .bind(line.stream.as_str())
        .bind(&line.line)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Ordered tail with `sequence > after`.
pub async fn read_after(
    pool: &SqlitePool,
    run_id: &RunId,
    after: i64,
) -> Result<Vec<JobLog>, StorageError> {
    let rows = sqlx::query(
        "SELECT sequence, stream, line FROM job_logs \
         WHERE run_id = ? AND sequence > ? ORDER BY sequence ASC",
    )
    .bind(run_id.as_str())
    .bind(after)
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| {
            let stream: String = row.try_get("stream")?;
            Ok(JobLog {
                run_id: run_id.clone(),
                sequence: row.try_get("sequence")?,
                stream: stream.parse()?,
                line: row.try_get("line")?,
            })
        })
        .collect()
}

/// Whether any rows exist for this run (drives the artifact fallback).
pub async fn has_any(pool: &SqlitePool, run_id: &RunId) -> Result<bool, StorageError> {
    let row = sqlx::query("SELECT 1 FROM job_logs WHERE run_id = ? LIMIT 1")
        .bind(run_id.as_str())
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}
