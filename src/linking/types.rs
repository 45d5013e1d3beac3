//! Core types for the linking pipeline

use crate::config::ConfigError;
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Identity of a document in the vault (its path)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(PathBuf);

impl DocumentId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// The document's title: its file name with the last extension stripped.
    ///
    /// `notes/Object-Oriented Programming.md` has the title
    /// `Object-Oriented Programming`; `v1.2 release.md` has `v1.2 release`.
    pub fn title(&self) -> Option<String> {
        self.0
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for DocumentId {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(PathBuf::from(s))
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(PathBuf::from(s))
    }
}

/// A document loaded for one linking pass
///
/// The content is owned by the worker processing it; nothing else holds a
/// reference during its turn.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub content: String,
    /// Set once substitution has changed `content`
    pub dirty: bool,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            dirty: false,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.id.title()
    }

    /// Replace the content with a substitution result, marking the document
    /// dirty if anything changed.
    pub fn apply(&mut self, substitution: Substitution) {
        if substitution.changed {
            self.content = substitution.text;
            self.dirty = true;
        }
    }
}

/// What a protected span of text is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    /// `---` delimited metadata header at the very start of the document
    Frontmatter,
    /// ``` or ~~~ fenced block
    FencedCode,
    /// Backtick code span
    InlineCode,
    /// `[[...]]` wiki-link (or `![[...]]` embed)
    ExistingLink,
    /// Markdown link or image (inline, reference or autolink) and reference definitions
    MarkdownLink,
    /// Bare `http://` / `https://` URL
    Url,
}

impl RegionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Frontmatter => "frontmatter",
            RegionKind::FencedCode => "fenced-code",
            RegionKind::InlineCode => "inline-code",
            RegionKind::ExistingLink => "existing-link",
            RegionKind::MarkdownLink => "markdown-link",
            RegionKind::Url => "url",
        }
    }
}

/// A half-open byte span `[start, end)` of a document's original text that
/// substitution must leave untouched. Offsets always fall on char boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedRegion {
    pub start: usize,
    pub end: usize,
    pub kind: RegionKind,
}

impl ProtectedRegion {
    pub fn new(start: usize, end: usize, kind: RegionKind) -> Self {
        Self { start, end, kind }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }
}

/// The disjoint protected regions of one document, ordered by start offset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedRegions {
    regions: Vec<ProtectedRegion>,
}

impl ProtectedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region. Empty regions are ignored.
    ///
    /// Callers only insert spans that lie in gaps between existing regions;
    /// the set stays sorted and disjoint.
    pub(crate) fn insert(&mut self, region: ProtectedRegion) {
        if region.is_empty() {
            return;
        }
        debug_assert!(!self.overlaps(&region.range()), "protected regions must be disjoint");
        let pos = self.regions.partition_point(|r| r.start < region.start);
        self.regions.insert(pos, region);
    }

    /// Whether `range` shares at least one byte with any protected region
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        // First region that ends after the range starts is the only candidate
        let idx = self.regions.partition_point(|r| r.end <= range.start);
        self.regions
            .get(idx)
            .is_some_and(|r| r.overlaps(range))
    }

    /// Unprotected spans of a text of length `len`, in order
    pub fn gaps(&self, len: usize) -> Vec<Range<usize>> {
        let mut gaps = Vec::with_capacity(self.regions.len() + 1);
        let mut cursor = 0;
        for region in &self.regions {
            if region.start > cursor {
                gaps.push(cursor..region.start);
            }
            cursor = cursor.max(region.end);
        }
        if cursor < len {
            gaps.push(cursor..len);
        }
        gaps
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProtectedRegion> {
        self.regions.iter()
    }

    pub fn of_kind(&self, kind: RegionKind) -> impl Iterator<Item = &ProtectedRegion> {
        self.regions.iter().filter(move |r| r.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// One accepted title mention, in original-text offsets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkOccurrence {
    pub start: usize,
    pub end: usize,
    /// The text as it appeared in the document (and inside the link)
    pub matched: String,
    /// Canonical title from the index
    pub title: String,
}

/// Output of the substitution engine for one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    pub changed: bool,
    pub links: Vec<LinkOccurrence>,
}

impl Substitution {
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            changed: false,
            links: Vec::new(),
        }
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}

/// Error types for linking
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Invalid title '{title}': {reason}")]
    InvalidTitle { title: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker failed: {0}")]
    Worker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_strips_last_extension() {
        let id = DocumentId::new("vault/notes/Object-Oriented Programming.md");
        assert_eq!(id.title().as_deref(), Some("Object-Oriented Programming"));

        let dotted = DocumentId::new("vault/v1.2 release.md");
        assert_eq!(dotted.title().as_deref(), Some("v1.2 release"));
    }

    #[test]
    fn test_document_apply_marks_dirty_only_on_change() {
        let mut doc = Document::new("a.md", "hello");
        doc.apply(Substitution::unchanged("hello"));
        assert!(!doc.dirty);

        doc.apply(Substitution {
            text: "[[hello]]".into(),
            changed: true,
            links: Vec::new(),
        });
        assert!(doc.dirty);
        assert_eq!(doc.content, "[[hello]]");
    }

    #[test]
    fn test_regions_overlap_is_half_open() {
        let mut regions = ProtectedRegions::new();
        regions.insert(ProtectedRegion::new(10, 20, RegionKind::InlineCode));
        regions.insert(ProtectedRegion::new(30, 35, RegionKind::ExistingLink));

        assert!(!regions.overlaps(&(0..10)));
        assert!(regions.overlaps(&(5..11)));
        assert!(regions.overlaps(&(19..25)));
        assert!(!regions.overlaps(&(20..30)));
        assert!(regions.overlaps(&(34..40)));
        assert!(!regions.overlaps(&(35..40)));
    }

    #[test]
    fn test_regions_stay_sorted_and_expose_gaps() {
        let mut regions = ProtectedRegions::new();
        regions.insert(ProtectedRegion::new(30, 35, RegionKind::Url));
        regions.insert(ProtectedRegion::new(0, 8, RegionKind::Frontmatter));
        regions.insert(ProtectedRegion::new(12, 12, RegionKind::InlineCode));

        let starts: Vec<_> = regions.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 30]);
        assert_eq!(regions.gaps(40), vec![8..30, 35..40]);
        assert_eq!(regions.gaps(35), vec![8..30]);
    }
}
