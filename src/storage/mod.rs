//! Document storage for vaultlink
//!
//! The linking pipeline reads and writes documents through the
//! `DocumentStore` trait. `FsStore` works on a vault directory;
//! `MemoryStore` keeps everything in memory.

mod discovery;
mod fs;
mod memory;
mod traits;

pub use discovery::discover_notes;
pub use fs::FsStore;
pub use memory::MemoryStore;
pub use traits::{DocumentStore, StorageError, StorageResult};
