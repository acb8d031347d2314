// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Label-based run routing

use std::collections::BTreeMap;

/// Routing labels on workers and runs. An empty map means "no labels".
pub type Labels = BTreeMap<String, String>;

/// Check if worker labels satisfy required labels (subset match).
///
/// Empty requirements match any worker. Otherwise every required `(k, v)`
/// pair must appear in the worker's labels with an equal value, so a worker
/// with no labels only matches runs with no requirements.
pub fn labels_match(required: &Labels, worker: &Labels) -> bool {
    required.iter().all(|(key, value)| worker.get(key) == Some(value))
}

/// Parse a CSV of `key=value` pairs (the `ORCH_LABELS` worker format).
///
/// Pairs without `=` are skipped; keys and values are trimmed.
pub fn parse_label_csv(raw: &str) -> Labels {
    raw.split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
#[path = "labels_tests.rs"]
mod tests;
