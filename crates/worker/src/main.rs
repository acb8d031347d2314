// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fcw: the Flight Control worker process

use fc_core::{labels::parse_label_csv, RunId, WorkerId, WorkerStatus};
use fc_worker::runner;
use fc_worker::{config, ServerClient};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// The run currently executing, if any, with its cancellation handle.
type CurrentRun = Arc<Mutex<Option<(RunId, CancellationToken)>>>;

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_new(config::log_level()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "fatal");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), fc_worker::WorkerError> {
    let client = Arc::new(ServerClient::new(
        &config::server_url(),
        &config::api_key(),
        &config::workspace_id(),
    ));
    let worker_name = config::worker_name();
    let labels = parse_label_csv(&config::labels_csv());

    tracing::info!(name = %worker_name, server = %config::server_url(), "registering worker");
    let registered = client.register(&worker_name, labels).await?;
    let worker_id = registered.id;
    tracing::info!(worker = %worker_id, "registered");

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let current_run: CurrentRun = Arc::new(Mutex::new(None));
    let heartbeat_task = tokio::spawn(heartbeat_loop(
        Arc::clone(&client),
        worker_id.clone(),
        Arc::clone(&current_run),
        shutdown.clone(),
    ));

    // Main loop: poll, execute, idle-wait.
    while !shutdown.is_cancelled() {
        match client.poll(&worker_id).await {
            Ok(Some(envelope)) => {
                let run_cancel = CancellationToken::new();
                *current_run.lock() = Some((envelope.run_id.clone(), run_cancel.clone()));
                runner::execute_run(
                    Arc::clone(&client),
                    &worker_id,
                    envelope,
                    run_cancel,
                    config::log_batch_interval(),
                )
                .await;
                *current_run.lock() = None;
                // Refresh liveness promptly after finishing a run.
                if let Err(err) = client.heartbeat(&worker_id, WorkerStatus::Online).await {
                    tracing::warn!(error = %err, "post-run heartbeat failed");
                }
            }
            Ok(None) => {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(config::poll_interval()) => {}
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "poll failed");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(config::poll_interval()) => {}
                }
            }
        }
    }

    let _ = heartbeat_task.await;
    tracing::info!("worker shutting down");
    Ok(())
}

/// Periodic liveness refresh. The response may carry a server-side
/// cancellation of the current run; firing its token kills the agent
/// without waiting for the next poll.
async fn heartbeat_loop(
    client: Arc<ServerClient>,
    worker_id: WorkerId,
    current_run: CurrentRun,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(config::heartbeat_interval()) => {}
        }

        let status = if current_run.lock().is_some() {
            WorkerStatus::Busy
        } else {
            WorkerStatus::Online
        };
        match client.heartbeat(&worker_id, status).await {
            Ok(response) => {
                if let Some(cancelled) = response.cancelled_run_id {
                    let guard = current_run.lock();
                    if let Some((run_id, cancel)) = guard.as_ref() {
                        if *run_id == cancelled {
                            tracing::info!(run = %run_id, "server cancelled current run");
                            cancel.cancel();
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "heartbeat failed");
            }
        }
    }
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = term.recv() => {}
                    }
                }
                Err(_) => {
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        tracing::info!("shutdown signal received");
        shutdown.cancel();
    });
}
