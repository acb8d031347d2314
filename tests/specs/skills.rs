// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::support::{self, TestServer};

async fn upload_skill(server: &TestServer, skill_md: &str) -> (reqwest::StatusCode, serde_json::Value) {
    let part = reqwest::multipart::Part::bytes(skill_md.as_bytes().to_vec())
        .file_name("SKILL.md")
        .mime_str("text/markdown")
        .expect("part");
    let form = reqwest::multipart::Form::new().part("skill_md", part);
    let response = server
        .request(reqwest::Method::POST, "/skills")
        .multipart(form)
        .send()
        .await
        .expect("upload");
    let status = response.status();
    let body = response.json().await.unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn valid_skill_uploads_and_lists() {
    let server = support::start().await;
    let (status, body) = upload_skill(
        &server,
        "---\nname: pdf-tools\ndescription: Work with PDFs\n---\nUse qpdf.\n",
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{body}");
    assert_eq!(body["name"], "pdf-tools");
    assert_eq!(body["file_count"], 1);

    let skills = server.get_json("/skills").await;
    assert_eq!(skills.as_array().map(Vec::len), Some(1));

    let skill_id = body["id"].as_str().expect("skill id");
    let detail = server.get_json(&format!("/skills/{skill_id}")).await;
    assert_eq!(detail["instructions"], "Use qpdf.");
    assert_eq!(detail["files"][0]["file_path"], "SKILL.md");

    // The stored SKILL.md is downloadable for workers.
    let response = server
        .request(reqwest::Method::GET, &format!("/skills/{skill_id}/files/SKILL.md"))
        .send()
        .await
        .expect("download");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let text = response.text().await.expect("text");
    assert!(text.contains("name: pdf-tools"));
}

#[tokio::test]
async fn double_hyphen_name_is_unprocessable_and_mentions_hyphen() {
    let server = support::start().await;
    let (status, body) = upload_skill(
        &server,
        "---\nname: My--Skill\ndescription: bad name\n---\nbody\n",
    )
    .await;
    assert_eq!(status, reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["detail"].as_str().unwrap_or_default().contains("hyphen"),
        "detail should mention hyphens: {body}"
    );
}

#[tokio::test]
async fn duplicate_skill_name_conflicts() {
    let server = support::start().await;
    let doc = "---\nname: research\ndescription: Deep research\n---\nbody\n";
    let (status, _) = upload_skill(&server, doc).await;
    assert_eq!(status, reqwest::StatusCode::CREATED);
    let (status, _) = upload_skill(&server, doc).await;
    assert_eq!(status, reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn dispatch_attaches_all_workspace_skills_by_default() {
    let server = support::start().await;
    upload_skill(&server, "---\nname: alpha\ndescription: a\n---\nuse alpha\n").await;
    upload_skill(&server, "---\nname: beta\ndescription: b\n---\nuse beta\n").await;

    let worker = server.register_worker("w", &[]).await;
    // skill_ids defaults to null → all workspace skills.
    let (status, run) = server
        .post_json(
            "/runs",
            serde_json::json!({ "name": "skilled", "task_prompt": "go" }),
        )
        .await;
    assert_eq!(status, reqwest::StatusCode::CREATED, "{run}");

    let envelope = server.poll(&worker).await;
    let skills = envelope["skills"].as_array().expect("skills");
    assert_eq!(skills.len(), 2);
    for skill in skills {
        let file = &skill["files"][0];
        assert_eq!(file["file_path"], "SKILL.md");
        assert_eq!(file["checksum_sha256"].as_str().map(str::len), Some(64));
        // Bytes are never embedded in the envelope.
        assert!(skill.get("bytes").is_none());
    }
}
