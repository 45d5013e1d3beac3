//! Note discovery under a vault root

use super::traits::{StorageError, StorageResult};
use crate::config::LinkerConfig;
use crate::linking::DocumentId;
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Find every note under `root`, sorted by path.
///
/// Symlinks are not followed. Unreadable subdirectories are logged and
/// skipped; only an unusable root is an error.
pub fn discover_notes(root: &Path, config: &LinkerConfig) -> StorageResult<Vec<DocumentId>> {
    if !root.is_dir() {
        return Err(StorageError::InvalidRoot(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| config.include_hidden || entry.depth() == 0 || !is_hidden(entry));

    let mut notes = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => return Err(StorageError::Discovery(err)),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable vault entry");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }
        let is_note = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.matches_extension(ext));
        if is_note {
            notes.push(DocumentId::new(entry.into_path()));
        }
    }

    notes.sort();
    tracing::debug!(root = %root.display(), count = notes.len(), "discovered notes");
    Ok(notes)
}
