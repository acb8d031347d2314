// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent subprocess adapter
//!
//! The agent is a black box: spawn it with the run's environment, read
//! `(stream, line)` pairs off stdout/stderr, and collect an exit code.
//! The named `agent_config` keys the adapter reads are `provider`,
//! `model`, and `max_turns`; everything else passes through untouched.

use fc_api::DispatchEnvelope;
use fc_core::LogStream;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DEFAULT_PROVIDER: &str = "anthropic";
const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// How an agent invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentExit {
    /// Process exited on its own.
    Exited(i64),
    /// Killed after `timeout_seconds` elapsed.
    TimedOut,
    /// Killed because the server cancelled the run.
    Cancelled,
}

impl AgentExit {
    pub fn exit_code(&self) -> i64 {
        match self {
            AgentExit::Exited(code) => *code,
            AgentExit::TimedOut | AgentExit::Cancelled => -1,
        }
    }
}

fn config_str<'a>(envelope: &'a DispatchEnvelope, key: &str, default: &'a str) -> &'a str {
    envelope.agent_config.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

/// Build the agent command line for an envelope.
pub fn build_command(envelope: &DispatchEnvelope) -> (String, Vec<String>) {
    let provider = config_str(envelope, "provider", DEFAULT_PROVIDER);
    let model = config_str(envelope, "model", DEFAULT_MODEL);

    let mut args = vec![
        "run".to_string(),
        "--no-session".to_string(),
        "-t".to_string(),
        envelope.task_prompt.clone(),
    ];
    if let Some(max_turns) = envelope.agent_config.get("max_turns").and_then(|v| v.as_i64()) {
        args.push("--max-turns".to_string());
        args.push(max_turns.to_string());
    }
    args.push("--provider".to_string());
    args.push(provider.to_string());
    args.push("--model".to_string());
    args.push(model.to_string());

    ("goose".to_string(), args)
}

/// Write the MCP server profile the agent discovers via its config dir.
/// Returns the profile path, or `None` when no servers are configured.
pub fn write_mcp_profile(
    envelope: &DispatchEnvelope,
    work_dir: &Path,
) -> std::io::Result<Option<std::path::PathBuf>> {
    if envelope.mcp_servers.is_empty() {
        return Ok(None);
    }
    let mut extensions = serde_json::Map::new();
    for server in &envelope.mcp_servers {
        let name = server
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("mcp-server")
            .to_string();
        let mut entry = serde_json::Map::new();
        entry.insert(
            "type".to_string(),
            server.get("type").cloned().unwrap_or_else(|| serde_json::json!("stdio")),
        );
        entry.insert(
            "command".to_string(),
            server.get("command").cloned().unwrap_or_else(|| serde_json::json!("")),
        );
        entry.insert(
            "args".to_string(),
            server.get("args").cloned().unwrap_or_else(|| serde_json::json!([])),
        );
        if let Some(env) = server.get("env") {
            entry.insert("env".to_string(), env.clone());
        }
        extensions.insert(name, serde_json::Value::Object(entry));
    }

    let profile_dir = work_dir.join(".config").join("goose");
    std::fs::create_dir_all(&profile_dir)?;
    let profile_path = profile_dir.join("profiles.json");
    let profile = serde_json::json!({ "orchestrator": { "extensions": extensions } });
    std::fs::write(&profile_path, serde_json::to_vec_pretty(&profile)?)?;
    Ok(Some(profile_path))
}

/// Spawn the agent and stream its output lines into `tx`. Blocks until
/// the process exits, times out, or the run is cancelled.
pub async fn run_agent(
    envelope: &DispatchEnvelope,
    work_dir: &Path,
    tx: mpsc::Sender<(LogStream, String)>,
    cancel: CancellationToken,
) -> AgentExit {
    let (program, args) = build_command(envelope);

    let mut command = tokio::process::Command::new(&program);
    command
        .args(&args)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .envs(&envelope.env_vars)
        .envs(&envelope.credentials)
        .env("GOOSE_PROVIDER", config_str(envelope, "provider", DEFAULT_PROVIDER))
        .env("GOOSE_MODEL", config_str(envelope, "model", DEFAULT_MODEL));

    match write_mcp_profile(envelope, work_dir) {
        Ok(Some(_)) => {
            command.env("GOOSE_PROFILE", "orchestrator");
            command.env("GOOSE_CONFIG_DIR", work_dir.join(".config").join("goose"));
        }
        Ok(None) => {}
        Err(err) => {
            let _ = tx.send((LogStream::Stderr, format!("failed to write MCP profile: {err}"))).await;
        }
    }

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let _ = tx
                .send((
                    LogStream::Stderr,
                    format!("Error: '{program}' command not found. Is the agent installed?"),
                ))
                .await;
            return AgentExit::Exited(127);
        }
        Err(err) => {
            let _ = tx.send((LogStream::Stderr, format!("failed to spawn agent: {err}"))).await;
            return AgentExit::Exited(-1);
        }
    };

    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(read_lines(stdout, LogStream::Stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(read_lines(stderr, LogStream::Stderr, tx.clone())));
    }

    let timeout = Duration::from_secs(envelope.timeout_seconds.max(0) as u64);
    let exit = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => AgentExit::Exited(status.code().unwrap_or(-1) as i64),
            Err(err) => {
                let _ = tx.send((LogStream::Stderr, format!("agent wait failed: {err}"))).await;
                AgentExit::Exited(-1)
            }
        },
        _ = tokio::time::sleep(timeout) => {
            let _ = child.kill().await;
            let _ = tx.send((LogStream::Stderr, "Process timed out and was killed".to_string())).await;
            AgentExit::TimedOut
        }
        _ = cancel.cancelled() => {
            let _ = child.kill().await;
            let _ = tx.send((LogStream::Stderr, "Run cancelled by server".to_string())).await;
            AgentExit::Cancelled
        }
    };

    // Drain whatever output is still buffered.
    for reader in readers {
        let _ = reader.await;
    }
    exit
}

async fn read_lines<R>(reader: R, stream: LogStream, tx: mpsc::Sender<(LogStream, String)>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let trimmed = line.trim_end().to_string();
        if trimmed.is_empty() {
            continue;
        }
        if tx.send((stream, trimmed)).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
