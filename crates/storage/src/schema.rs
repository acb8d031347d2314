// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema bootstrap. Timestamps are UTC epoch milliseconds; dynamic
//! mapping snapshots are JSON text columns.

use crate::StorageError;
use sqlx::SqlitePool;

const TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS workspaces (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        slug TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        display_name TEXT,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS workspace_members (
        workspace_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'member',
        created_at INTEGER NOT NULL,
        PRIMARY KEY (workspace_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS api_keys (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        key_hash TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL DEFAULT 'worker',
        user_id TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS credentials (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        name TEXT NOT NULL,
        env_var TEXT NOT NULL,
        encrypted_value TEXT NOT NULL,
        description TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE (workspace_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS job_definitions (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        task_prompt TEXT NOT NULL,
        agent_type TEXT NOT NULL DEFAULT 'goose',
        agent_config TEXT NOT NULL DEFAULT '{}',
        mcp_servers TEXT NOT NULL DEFAULT '[]',
        env_vars TEXT NOT NULL DEFAULT '{}',
        credential_ids TEXT NOT NULL DEFAULT '[]',
        labels TEXT NOT NULL DEFAULT '{}',
        skill_ids TEXT,
        timeout_seconds INTEGER NOT NULL DEFAULT 1800,
        max_retries INTEGER NOT NULL DEFAULT 0,
        retry_backoff_seconds INTEGER NOT NULL DEFAULT 60,
        webhook_url TEXT,
        webhook_secret TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_job_definitions_workspace
        ON job_definitions (workspace_id, created_at)",
    "CREATE TABLE IF NOT EXISTS job_runs (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        job_definition_id TEXT,
        status TEXT NOT NULL DEFAULT 'queued',
        worker_id TEXT,
        name TEXT NOT NULL,
        task_prompt TEXT NOT NULL,
        agent_type TEXT NOT NULL DEFAULT 'goose',
        agent_config TEXT NOT NULL DEFAULT '{}',
        mcp_servers TEXT NOT NULL DEFAULT '[]',
        env_vars TEXT NOT NULL DEFAULT '{}',
        credential_ids TEXT NOT NULL DEFAULT '[]',
        required_labels TEXT NOT NULL DEFAULT '{}',
        skill_ids TEXT,
        timeout_seconds INTEGER NOT NULL DEFAULT 1800,
        max_retries INTEGER NOT NULL DEFAULT 0,
        retry_backoff_seconds INTEGER NOT NULL DEFAULT 60,
        attempt_number INTEGER NOT NULL DEFAULT 1,
        parent_run_id TEXT,
        webhook_url TEXT,
        webhook_secret TEXT,
        scheduled_at INTEGER,
        started_at INTEGER,
        completed_at INTEGER,
        result TEXT,
        exit_code INTEGER,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_job_runs_dispatch
        ON job_runs (workspace_id, status, created_at, id)",
    "CREATE TABLE IF NOT EXISTS workers (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        name TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'online',
        labels TEXT NOT NULL DEFAULT '{}',
        last_heartbeat INTEGER NOT NULL,
        current_run_id TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS schedules (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        job_definition_id TEXT NOT NULL,
        cron_expression TEXT NOT NULL,
        enabled INTEGER NOT NULL DEFAULT 1,
        name TEXT,
        next_run_at INTEGER,
        last_run_at INTEGER,
        last_run_id TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_schedules_due
        ON schedules (enabled, next_run_at)",
    "CREATE TABLE IF NOT EXISTS job_logs (
        run_id TEXT NOT NULL,
        sequence INTEGER NOT NULL,
        stream TEXT NOT NULL,
        line TEXT NOT NULL,
        PRIMARY KEY (run_id, sequence)
    )",
    "CREATE TABLE IF NOT EXISTS artifacts (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        run_id TEXT NOT NULL,
        filename TEXT NOT NULL,
        content_type TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        checksum_sha256 TEXT NOT NULL,
        storage_path TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        UNIQUE (run_id, filename)
    )",
    "CREATE TABLE IF NOT EXISTS skills (
        id TEXT PRIMARY KEY,
        workspace_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        instructions TEXT NOT NULL,
        license TEXT,
        compatibility TEXT,
        metadata TEXT,
        allowed_tools TEXT,
        total_size_bytes INTEGER NOT NULL DEFAULT 0,
        file_count INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE (workspace_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS skill_files (
        skill_id TEXT NOT NULL,
        file_path TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        checksum_sha256 TEXT NOT NULL,
        content_type TEXT NOT NULL,
        PRIMARY KEY (skill_id, file_path)
    )",
];

pub(crate) async fn bootstrap(pool: &SqlitePool) -> Result<(), StorageError> {
    for ddl in TABLES {
        sqlx::query(ddl).execute(pool).await?;
    }
    Ok(())
}
