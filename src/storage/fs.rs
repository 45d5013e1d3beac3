//! Filesystem-backed document store

use super::traits::{decode_utf8, DocumentStore, StorageError, StorageResult};
use crate::linking::DocumentId;
use async_trait::async_trait;
use std::io::{self, Write};
use std::path::Path;

/// Reads and writes documents on the local filesystem as UTF-8.
///
/// With atomic writes enabled (the default) new content goes to a temporary
/// file in the same directory, which is then renamed over the original, so
/// an interrupted run never leaves a half-written note.
#[derive(Debug, Clone)]
pub struct FsStore {
    atomic_writes: bool,
}

impl Default for FsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FsStore {
    pub fn new() -> Self {
        Self {
            atomic_writes: true,
        }
    }

    pub fn with_atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }
}

fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(text.as_bytes())?;
    tmp.as_file().sync_all()?;

    // Temp files are created 0600; keep the note's original mode
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl DocumentStore for FsStore {
    async fn read(&self, id: &DocumentId) -> StorageResult<String> {
        let bytes = tokio::fs::read(id.as_path())
            .await
            .map_err(|e| StorageError::from_io(id, e))?;
        decode_utf8(id, bytes)
    }

    async fn write(&self, id: &DocumentId, text: &str) -> StorageResult<()> {
        if !self.atomic_writes {
            return tokio::fs::write(id.as_path(), text)
                .await
                .map_err(|e| StorageError::from_io(id, e));
        }

        let path = id.as_path().to_path_buf();
        let text = text.to_owned();
        tokio::task::spawn_blocking(move || write_atomic(&path, &text))
            .await
            .map_err(|e| StorageError::Io {
                id: id.clone(),
                source: io::Error::other(e),
            })?
            .map_err(|e| StorageError::from_io(id, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_write_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Note.md");
        std::fs::write(&path, "before").unwrap();

        let store = FsStore::new();
        let id = DocumentId::new(&path);
        assert_eq!(store.read(&id).await.unwrap(), "before");

        store.write(&id, "after [[Link]]").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "after [[Link]]");

        // No temp files left behind
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let id = DocumentId::new(dir.path().join("missing.md"));

        let err = FsStore::new().read(&id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_read_invalid_utf8_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.md");
        std::fs::write(&path, [0x63, 0x61, 0x66, 0xe9]).unwrap();

        let err = FsStore::new().read(&DocumentId::new(&path)).await.unwrap_err();
        assert!(matches!(err, StorageError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let id = DocumentId::new(dir.path().join("gone").join("Note.md"));

        let atomic = FsStore::new().write(&id, "x").await;
        let direct = FsStore::new().with_atomic_writes(false).write(&id, "x").await;
        assert!(atomic.is_err());
        assert!(direct.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_atomic_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Shared.md");
        std::fs::write(&path, "a").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        FsStore::new().write(&DocumentId::new(&path), "b").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
