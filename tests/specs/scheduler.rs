// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::support;
use chrono::{Duration, Utc};
use fc_core::ScheduleId;
use fc_storage::schedules;

#[tokio::test]
async fn invalid_cron_is_rejected_at_create() {
    let server = support::start().await;
    let (status, body) = server
        .post_json(
            "/schedules",
            serde_json::json!({
                "job_definition_id": "job-whatever",
                "cron_expression": "every tuesday",
            }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap_or_default().contains("cron"));
}

#[tokio::test]
async fn due_schedule_fires_once_and_advances() {
    let server = support::start().await;
    let (_, job) = server
        .post_json(
            "/jobs",
            serde_json::json!({ "name": "minutely", "task_prompt": "tick", "skill_ids": [] }),
        )
        .await;
    let job_id = job["id"].as_str().expect("job id");

    let (status, schedule) = server
        .post_json(
            "/schedules",
            serde_json::json!({
                "job_definition_id": job_id,
                "cron_expression": "*/1 * * * *",
                "name": "every-minute",
            }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{schedule}");
    let schedule_id = ScheduleId::from_string(schedule["id"].as_str().expect("id"));

    // Pull the gate into the past, then tick one second after it.
    let due_at = Utc::now() - Duration::seconds(30);
    schedules::set_next_run_at(server.state.db.pool(), &schedule_id, Some(due_at), Utc::now())
        .await
        .expect("set gate");
    let tick_at = due_at + Duration::seconds(1);
    let fired = fc_server::scheduler::tick(&server.state, tick_at).await.expect("tick");
    assert_eq!(fired, 1);

    let runs = server.get_json(&format!("/runs?job_id={job_id}")).await;
    assert_eq!(runs.as_array().map(Vec::len), Some(1));
    let run_id = runs[0]["id"].as_str().expect("run id");
    assert_eq!(runs[0]["status"], "queued");

    let listed = server.get_json("/schedules").await;
    assert_eq!(listed[0]["last_run_id"], run_id);
    assert_eq!(listed[0]["job_name"], "minutely");
    let next: chrono::DateTime<Utc> =
        listed[0]["next_run_at"].as_str().expect("next").parse().expect("rfc3339");
    assert!(next > tick_at, "gate must advance past the tick");

    // A second tick at the same instant fires nothing.
    assert_eq!(fc_server::scheduler::tick(&server.state, tick_at).await.expect("tick"), 0);
}

#[tokio::test]
async fn disabled_schedules_carry_no_gate() {
    let server = support::start().await;
    let (_, job) = server
        .post_json(
            "/jobs",
            serde_json::json!({ "name": "paused", "task_prompt": "noop", "skill_ids": [] }),
        )
        .await;
    let job_id = job["id"].as_str().expect("job id");

    let (_, schedule) = server
        .post_json(
            "/schedules",
            serde_json::json!({
                "job_definition_id": job_id,
                "cron_expression": "0 9 * * *",
                "enabled": false,
            }),
        )
        .await;
    assert!(schedule["next_run_at"].is_null());
}
