// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::store::LocalStore;

#[tokio::test]
async fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.save("run-abc/nested/out.txt", b"hello").await.unwrap();
    assert_eq!(store.read("run-abc/nested/out.txt").await.unwrap(), b"hello");
}

#[tokio::test]
async fn overwrite_replaces_contents() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.save("a/f", b"one").await.unwrap();
    store.save("a/f", b"two").await.unwrap();
    assert_eq!(store.read("a/f").await.unwrap(), b"two");
}

#[tokio::test]
async fn delete_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.save("a/f", b"x").await.unwrap();
    store.delete("a/f").await.unwrap();
    store.delete("a/f").await.unwrap();
    assert!(!store.exists("a/f").await);
}

#[tokio::test]
async fn delete_tree_removes_everything_under_a_scope() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path());
    store.save("default/pdf-tools/SKILL.md", b"doc").await.unwrap();
    store.save("default/pdf-tools/scripts/run.sh", b"#!/bin/sh").await.unwrap();
    store.delete_tree("default/pdf-tools").await.unwrap();
    assert!(!store.exists("default/pdf-tools/SKILL.md").await);
    // A second delete of a missing tree is not an error.
    store.delete_tree("default/pdf-tools").await.unwrap();
}
