// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! fcd: the Flight Control control-plane daemon

use chrono::Utc;
use fc_core::SystemClock;
use fc_server::config::{self, ServerConfig};
use fc_server::{api, scheduler, sweep, AppState};
use fc_storage::{principals, Db};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_new(config::log_level())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "fatal");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load();
    tracing::info!(
        database = %config.database_url,
        host = %config.host,
        port = config.port,
        "starting flight control"
    );

    let db = Db::connect(&config.database_url).await?;
    principals::ensure_defaults(db.pool(), Utc::now()).await?;

    let state = AppState::new(db, config.clone());

    // Background tasks: scheduler ticks and liveness/timeout sweeps.
    let shutdown = CancellationToken::new();
    let scheduler_task =
        tokio::spawn(scheduler::run(state.clone(), SystemClock, shutdown.clone()));
    let sweeper_task = tokio::spawn(sweep::run(state.clone(), SystemClock, shutdown.clone()));

    let app = api::router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await?;

    // Let the scheduler finish its in-flight tick before exit.
    let _ = scheduler_task.await;
    let _ = sweeper_task.await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            Ok(term) => term,
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                let _ = ctrl_c.await;
                return;
            }
        };
        tokio::select! {
            _ = ctrl_c => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }
    tracing::info!("shutdown signal received");
}
