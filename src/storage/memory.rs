//! In-memory document store

use super::traits::{decode_utf8, DocumentStore, StorageError, StorageResult};
use crate::linking::DocumentId;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Concurrent in-memory store
///
/// Holds raw bytes so undecodable documents can be represented, and can be
/// told to fail reads or writes for specific documents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<DocumentId, Vec<u8>>,
    failing_reads: DashSet<DocumentId>,
    failing_writes: DashSet<DocumentId>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }

    pub fn insert(&self, id: impl Into<DocumentId>, text: impl Into<String>) {
        self.documents.insert(id.into(), text.into().into_bytes());
    }

    pub fn insert_bytes(&self, id: impl Into<DocumentId>, bytes: Vec<u8>) {
        self.documents.insert(id.into(), bytes);
    }

    /// Make every read of `id` fail with `PermissionDenied`
    pub fn fail_reads_for(&self, id: impl Into<DocumentId>) {
        self.failing_reads.insert(id.into());
    }

    /// Make every write of `id` fail with an IO error
    pub fn fail_writes_for(&self, id: impl Into<DocumentId>) {
        self.failing_writes.insert(id.into());
    }

    /// Current text of a document, if present and valid UTF-8
    pub fn get(&self, id: &DocumentId) -> Option<String> {
        self.documents
            .get(id)
            .and_then(|bytes| String::from_utf8(bytes.clone()).ok())
    }

    /// Identities of all stored documents, sorted
    pub fn ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.documents.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of successful writes so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, id: &DocumentId) -> StorageResult<String> {
        if self.failing_reads.contains(id) {
            return Err(StorageError::PermissionDenied(id.clone()));
        }
        let bytes = self
            .documents
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::NotFound(id.clone()))?;
        decode_utf8(id, bytes)
    }

    async fn write(&self, id: &DocumentId, text: &str) -> StorageResult<()> {
        if self.failing_writes.contains(id) {
            return Err(StorageError::Io {
                id: id.clone(),
                source: io::Error::other("write rejected"),
            });
        }
        self.documents.insert(id.clone(), text.as_bytes().to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
