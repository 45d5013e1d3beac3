//! Storage trait definitions

use crate::linking::DocumentId;
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Permission denied: {0}")]
    PermissionDenied(DocumentId),

    #[error("Invalid UTF-8 in {id}: {reason}")]
    Decode { id: DocumentId, reason: String },

    #[error("IO error on {id}: {source}")]
    Io {
        id: DocumentId,
        #[source]
        source: io::Error,
    },

    #[error("Vault root is not a directory: {}", .0.display())]
    InvalidRoot(PathBuf),

    #[error("Discovery error: {0}")]
    Discovery(#[from] walkdir::Error),
}

impl StorageError {
    /// Classify an IO error for a document
    pub fn from_io(id: &DocumentId, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(id.clone()),
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(id.clone()),
            io::ErrorKind::InvalidData => StorageError::Decode {
                id: id.clone(),
                reason: err.to_string(),
            },
            _ => StorageError::Io {
                id: id.clone(),
                source: err,
            },
        }
    }

    /// Short machine-readable name of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "not-found",
            StorageError::PermissionDenied(_) => "permission-denied",
            StorageError::Decode { .. } => "decode",
            StorageError::Io { .. } => "io",
            StorageError::InvalidRoot(_) => "invalid-root",
            StorageError::Discovery(_) => "discovery",
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Decode raw bytes as UTF-8 text
pub(crate) fn decode_utf8(id: &DocumentId, bytes: Vec<u8>) -> StorageResult<String> {
    String::from_utf8(bytes).map_err(|e| StorageError::Decode {
        id: id.clone(),
        reason: e.utf8_error().to_string(),
    })
}

/// Read/write access to document text
///
/// Implementations must be safe to call from many workers at once; each
/// document is read at most once and written at most once per batch.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document's full text.
    ///
    /// Fails with `NotFound`, `PermissionDenied` or `Decode`.
    async fn read(&self, id: &DocumentId) -> StorageResult<String>;

    /// Replace a document's full text.
    async fn write(&self, id: &DocumentId, text: &str) -> StorageResult<()>;
}
