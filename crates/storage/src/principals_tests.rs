// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::testutil::{db, t0};
use crate::principals::{self, DEFAULT_ADMIN_USER_ID, DEFAULT_WORKSPACE_ID};
use fc_core::{ApiKey, ApiKeyId, KeyRole, MemberRole, UserId, Workspace, WorkspaceId};

#[tokio::test]
async fn ensure_defaults_is_idempotent() {
    let db = db().await;
    principals::ensure_defaults(db.pool(), t0()).await.unwrap();
    principals::ensure_defaults(db.pool(), t0()).await.unwrap();

    let ws = WorkspaceId::from_string(DEFAULT_WORKSPACE_ID);
    let admin = UserId::from_string(DEFAULT_ADMIN_USER_ID);
    assert!(principals::get_workspace(db.pool(), &ws).await.unwrap().is_some());
    assert!(principals::get_user(db.pool(), &admin).await.unwrap().is_some());
    assert_eq!(
        principals::membership_role(db.pool(), &ws, &admin).await.unwrap(),
        Some(MemberRole::Owner)
    );
}

#[tokio::test]
async fn membership_miss_yields_none() {
    let db = db().await;
    principals::ensure_defaults(db.pool(), t0()).await.unwrap();
    let stranger = UserId::new();
    let ws = WorkspaceId::from_string(DEFAULT_WORKSPACE_ID);
    assert!(principals::membership_role(db.pool(), &ws, &stranger).await.unwrap().is_none());
}

#[tokio::test]
async fn create_workspace_grants_owner_membership() {
    let db = db().await;
    principals::ensure_defaults(db.pool(), t0()).await.unwrap();
    let admin = UserId::from_string(DEFAULT_ADMIN_USER_ID);

    let workspace = Workspace {
        id: WorkspaceId::new(),
        name: "Research".to_string(),
        slug: "research".to_string(),
        description: None,
        created_at: t0(),
        updated_at: t0(),
    };
    principals::create_workspace(db.pool(), &workspace, &admin).await.unwrap();

    assert_eq!(
        principals::membership_role(db.pool(), &workspace.id, &admin).await.unwrap(),
        Some(MemberRole::Owner)
    );
    let list = principals::workspaces_for_user(db.pool(), &admin).await.unwrap();
    assert_eq!(list.len(), 2);

    let members = principals::members_of(db.pool(), &workspace.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].1.username, "admin");
}

#[tokio::test]
async fn api_keys_resolve_by_hash_only() {
    let db = db().await;
    principals::ensure_defaults(db.pool(), t0()).await.unwrap();

    let key = ApiKey {
        id: ApiKeyId::new(),
        name: "ci-worker".to_string(),
        key_hash: "ab".repeat(32),
        role: KeyRole::Worker,
        user_id: UserId::from_string(DEFAULT_ADMIN_USER_ID),
        created_at: t0(),
    };
    principals::insert_api_key(db.pool(), &key).await.unwrap();

    let found = principals::api_key_by_hash(db.pool(), &key.key_hash).await.unwrap().unwrap();
    assert_eq!(found.role, KeyRole::Worker);
    assert!(principals::api_key_by_hash(db.pool(), "cd".repeat(32).as_str())
        .await
        .unwrap()
        .is_none());
}
