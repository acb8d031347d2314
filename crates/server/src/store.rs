// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem byte store for artifacts and skill files
//!
//! Paths are scoped by the caller (`{run_id}/{filename}`,
//! `{workspace_id}/{skill_name}/{relative_path}`) so collisions are
//! structurally impossible. Writers create parent directories; there is
//! no cross-process locking.

use std::io;
use std::path::{Path, PathBuf};

/// A byte store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base: PathBuf,
}

impl LocalStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.base.join(rel)
    }

    pub async fn save(&self, rel: &str, data: &[u8]) -> io::Result<()> {
        let path = self.resolve(rel);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await
    }

    pub async fn read(&self, rel: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.resolve(rel)).await
    }

    pub async fn delete(&self, rel: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.resolve(rel)).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Remove a whole subtree (skill deletion). Missing trees are fine.
    pub async fn delete_tree(&self, rel: &str) -> io::Result<()> {
        match tokio::fs::remove_dir_all(self.resolve(rel)).await {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    pub async fn exists(&self, rel: &str) -> bool {
        tokio::fs::try_exists(self.resolve(rel)).await.unwrap_or(false)
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
