// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::auth::{authenticate, hash_key};
use crate::testutil::{state, t0};
use crate::ApiError;
use fc_core::{ApiKey, ApiKeyId, KeyRole, UserId, WorkspaceId};
use fc_storage::principals;

#[test]
fn hash_key_is_sha256_hex() {
    assert_eq!(
        hash_key("admin"),
        "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
    );
    assert_eq!(hash_key("x").len(), 64);
}

#[tokio::test]
async fn default_admin_key_synthesises_an_admin_context() {
    let (state, _tmp) = state().await;
    let ws = WorkspaceId::from_string("default");
    let auth = authenticate(&state, "admin", &ws).await.unwrap();
    assert!(auth.is_admin());
    assert_eq!(auth.user.username, "admin");
    assert_eq!(auth.workspace_id, ws);
}

#[tokio::test]
async fn unknown_token_is_unauthenticated() {
    let (state, _tmp) = state().await;
    let ws = WorkspaceId::from_string("default");
    let err = authenticate(&state, "nope", &ws).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[tokio::test]
async fn stored_key_resolves_through_its_hash() {
    let (state, _tmp) = state().await;
    let ws = WorkspaceId::from_string("default");
    let key = ApiKey {
        id: ApiKeyId::new(),
        name: "worker-key".to_string(),
        key_hash: hash_key("wk_secret_token"),
        role: KeyRole::Worker,
        user_id: UserId::from_string("admin"),
        created_at: t0(),
    };
    principals::insert_api_key(state.db.pool(), &key).await.unwrap();

    let auth = authenticate(&state, "wk_secret_token", &ws).await.unwrap();
    assert!(!auth.is_admin());
    assert_eq!(auth.api_key.id, key.id);
}

#[tokio::test]
async fn non_membership_is_forbidden_without_leaking() {
    let (state, _tmp) = state().await;
    let foreign = WorkspaceId::from_string("someone-elses");
    let err = authenticate(&state, "admin", &foreign).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));
    // The message names the requested workspace, never its contents.
    assert!(err.to_string().contains("someone-elses"));
}
