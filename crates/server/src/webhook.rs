// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook notifier: fire-and-forget POST with HMAC signature

use crate::state::AppState;
use fc_api::WebhookPayload;
use fc_core::JobRun;
use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "X-FlightControl-Signature";

/// Hex HMAC-SHA256 of the payload bytes under the webhook secret.
pub fn signature(secret: &str, payload: &[u8]) -> String {
    // HMAC accepts keys of any length.
    match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(payload);
            format!("{:x}", mac.finalize().into_bytes())
        }
        Err(_) => unreachable!("hmac accepts any key length"),
    }
}

/// Fire the terminal-transition webhook for a run, if configured. Runs as
/// a detached task: delivery failures are logged and never reach the
/// caller of `complete_run`.
pub fn fire(state: &AppState, run: &JobRun) {
    let Some(url) = run.webhook_url.clone().filter(|u| !u.is_empty()) else {
        return;
    };
    let payload = WebhookPayload::from_run(run);
    let secret = run.webhook_secret.clone();
    let client = state.http.clone();
    let run_id = run.id.clone();

    tokio::spawn(async move {
        let body = match serde_json::to_vec(&payload) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(run = %run_id, error = %err, "webhook payload serialization");
                return;
            }
        };
        let mut request = client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.clone());
        if let Some(secret) = secret.filter(|s| !s.is_empty()) {
            request = request
                .header(SIGNATURE_HEADER, format!("sha256={}", signature(&secret, &body)));
        }
        match request.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(run = %run_id, url = %url, "webhook delivered");
            }
            Ok(response) => {
                tracing::warn!(run = %run_id, status = %response.status(), "webhook failed");
            }
            Err(err) => {
                tracing::warn!(run = %run_id, error = %err, "webhook failed");
            }
        }
    });
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
