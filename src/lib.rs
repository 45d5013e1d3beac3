//! Vaultlink: automatic wiki-linking for markdown vaults
//!
//! Scans a directory of markdown notes and turns plain-text mentions of
//! other notes' titles into `[[wiki-links]]`, without touching frontmatter,
//! code, or text that is already a link.
//!
//! # Core Concepts
//!
//! - **Titles**: a note's file name without its extension
//! - **Protected regions**: spans of a note that are never rewritten
//! - **Batch runs**: every note processed concurrently, failures isolated
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vaultlink::{discover_notes, BatchCoordinator, FsStore, LinkerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LinkerConfig::new();
//! let notes = discover_notes("my-vault".as_ref(), &config)?;
//! let coordinator = BatchCoordinator::new(Arc::new(FsStore::new()), config);
//! let report = coordinator.run(notes).await?;
//! println!("linked {} notes", report.edited_count());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod linking;
pub mod storage;

pub use config::{ConfigError, LinkerConfig};
pub use linking::{
    BatchCoordinator, BatchReport, CancellationToken, DocumentId, LinkError, TitleIndex,
};
pub use storage::{discover_notes, DocumentStore, FsStore, MemoryStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
