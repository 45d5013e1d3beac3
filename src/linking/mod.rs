//! Wiki-link insertion for a vault of markdown notes
//!
//! Every note's file name (minus extension) is a title. A linking pass
//! rewrites each plain-text mention of a title into `[[mention]]`, leaving
//! protected content alone:
//!
//! - YAML frontmatter at the top of the note
//! - fenced code blocks and inline code spans
//! - existing `[[wiki-links]]`, markdown links and bare URLs
//!
//! # Pipeline
//!
//! - **TitleIndex**: every title, ordered longest first, built once per run
//! - **extract_protected_regions**: byte spans substitution must not touch
//! - **substitute_links**: whole-word, case-insensitive, non-overlapping matches
//! - **BatchCoordinator**: runs the above for every document on a bounded
//!   pool of workers and aggregates a `BatchReport`
//!
//! # Example
//!
//! ```
//! use vaultlink::linking::{link_text, SubstituteOptions, TitleIndex};
//!
//! let index = TitleIndex::from_titles(["Graph Theory"]).unwrap();
//! let out = link_text("Notes on graph theory.", &index, &SubstituteOptions::new());
//! assert_eq!(out.text, "Notes on [[graph theory]].");
//! ```

mod coordinator;
mod regions;
mod substitute;
mod titles;
mod types;

pub use coordinator::{BatchCoordinator, BatchReport, DocumentFailure, DocumentOutcome, FailureStage};
pub use regions::extract_protected_regions;
pub use substitute::{
    link_text, substitute_links, substitute_links_with, SubstituteOptions, LINK_CLOSE, LINK_OPEN,
};
pub use titles::{TitleFilter, TitleIndex, TitlePattern};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    Document, DocumentId, LinkError, LinkOccurrence, ProtectedRegion, ProtectedRegions, RegionKind,
    Substitution,
};
