//! Shared helpers for vault integration tests
//!
//! A `TestVault` is a temporary directory of notes that is removed when the
//! vault is dropped.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use vaultlink::{discover_notes, BatchCoordinator, BatchReport, DocumentId, FsStore, LinkerConfig};

/// A throwaway vault on disk
pub struct TestVault {
    dir: TempDir,
}

impl TestVault {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp vault"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a note relative to the vault root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn id(&self, relative: &str) -> DocumentId {
        DocumentId::new(self.path(relative))
    }

    /// Write a note, creating parent directories as needed
    pub fn write(&self, relative: &str, content: &str) -> &Self {
        self.write_bytes(relative, content.as_bytes())
    }

    pub fn write_bytes(&self, relative: &str, content: &[u8]) -> &Self {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create note directory");
        }
        fs::write(&path, content).expect("write note");
        self
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).expect("read note")
    }

    /// Discover and link every note with the given config
    pub async fn link_with(&self, config: LinkerConfig) -> BatchReport {
        let notes = discover_notes(self.root(), &config).expect("discover notes");
        let store = Arc::new(FsStore::new().with_atomic_writes(config.atomic_writes));
        BatchCoordinator::new(store, config)
            .run(notes)
            .await
            .expect("batch run")
    }

    pub async fn link(&self) -> BatchReport {
        self.link_with(LinkerConfig::new().with_concurrency(4)).await
    }
}
