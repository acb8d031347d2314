// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::agent::{build_command, write_mcp_profile, AgentExit};
use fc_api::DispatchEnvelope;
use fc_core::RunId;

fn envelope() -> DispatchEnvelope {
    DispatchEnvelope {
        run_id: RunId::new(),
        name: "triage".to_string(),
        task_prompt: "fix the bug".to_string(),
        agent_type: "goose".to_string(),
        agent_config: serde_json::Map::new(),
        mcp_servers: Vec::new(),
        env_vars: Default::default(),
        credentials: Default::default(),
        skills: Vec::new(),
        timeout_seconds: 600,
    }
}

#[test]
fn command_carries_prompt_and_defaults() {
    let (program, args) = build_command(&envelope());
    assert_eq!(program, "goose");
    assert_eq!(args[..4], ["run", "--no-session", "-t", "fix the bug"]);
    let rendered = args.join(" ");
    assert!(rendered.contains("--provider anthropic"));
    assert!(rendered.contains("--model claude-sonnet-4-5"));
    assert!(!rendered.contains("--max-turns"));
}

#[test]
fn command_honours_agent_config_overrides() {
    let mut env = envelope();
    env.agent_config.insert("provider".to_string(), serde_json::json!("openai"));
    env.agent_config.insert("model".to_string(), serde_json::json!("gpt-4o"));
    env.agent_config.insert("max_turns".to_string(), serde_json::json!(12));

    let (_, args) = build_command(&env);
    let rendered = args.join(" ");
    assert!(rendered.contains("--provider openai"));
    assert!(rendered.contains("--model gpt-4o"));
    assert!(rendered.contains("--max-turns 12"));
}

#[test]
fn mcp_profile_is_skipped_without_servers() {
    let dir = tempfile::tempdir().unwrap();
    assert!(write_mcp_profile(&envelope(), dir.path()).unwrap().is_none());
}

#[test]
fn mcp_profile_lists_every_server() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = envelope();
    env.mcp_servers = vec![
        serde_json::json!({"name": "github", "type": "stdio", "command": "gh-mcp", "args": ["serve"]}),
        serde_json::json!({"name": "search", "command": "search-mcp", "env": {"KEY": "v"}}),
    ];

    let path = write_mcp_profile(&env, dir.path()).unwrap().unwrap();
    let profile: serde_json::Value =
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
    let extensions = &profile["orchestrator"]["extensions"];
    assert_eq!(extensions["github"]["command"], "gh-mcp");
    assert_eq!(extensions["github"]["type"], "stdio");
    // Missing type defaults to stdio.
    assert_eq!(extensions["search"]["type"], "stdio");
    assert_eq!(extensions["search"]["env"]["KEY"], "v");
}

#[test]
fn exit_codes_collapse_to_negative_one_for_kills() {
    assert_eq!(AgentExit::Exited(0).exit_code(), 0);
    assert_eq!(AgentExit::Exited(3).exit_code(), 3);
    assert_eq!(AgentExit::TimedOut.exit_code(), -1);
    assert_eq!(AgentExit::Cancelled.exit_code(), -1);
}
