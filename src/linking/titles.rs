//! Title index
//!
//! Maps lowercase titles to their canonical spelling and holds one compiled
//! case-insensitive matcher per title, ordered longest first.

use super::types::{DocumentId, LinkError};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

/// A title ready for matching
#[derive(Debug, Clone)]
pub struct TitlePattern {
    /// Lowercase key
    pub key: String,
    /// Title as spelled by the file name
    pub canonical: String,
    /// Length of the key in chars, the primary sort key
    pub char_len: usize,
    matcher: Regex,
}

impl TitlePattern {
    fn compile(key: String, canonical: String) -> Result<Self, LinkError> {
        let matcher = RegexBuilder::new(&regex::escape(&canonical))
            .case_insensitive(true)
            .build()
            .map_err(|e| LinkError::InvalidTitle {
                title: canonical.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            char_len: key.chars().count(),
            key,
            canonical,
            matcher,
        })
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }
}

/// Characters that would break `[[...]]` markup if linked
const FORBIDDEN_TITLE_CHARS: &[char] = &['[', ']', '|', '`'];

/// Options controlling which titles get indexed
#[derive(Debug, Clone, Copy)]
pub struct TitleFilter {
    /// Titles shorter than this many chars are ignored
    pub min_length: usize,
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self { min_length: 1 }
    }
}

impl TitleFilter {
    fn accepts(&self, title: &str) -> bool {
        title.chars().count() >= self.min_length.max(1)
            && title.chars().any(char::is_alphanumeric)
            && !title.contains(FORBIDDEN_TITLE_CHARS)
    }
}

/// Immutable lookup table of recognizable titles
///
/// Built once per batch before any document is processed, then shared
/// read-only between workers.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    canonical: BTreeMap<String, String>,
    /// Sorted by descending char length, then by key
    patterns: Vec<TitlePattern>,
}

impl TitleIndex {
    /// Build the index from document identities.
    ///
    /// Identities are sorted by path first; when two titles collide
    /// case-insensitively the later path wins. Document bodies are never read.
    pub fn build<'a, I>(ids: I, filter: TitleFilter) -> Result<Self, LinkError>
    where
        I: IntoIterator<Item = &'a DocumentId>,
    {
        let mut ordered: Vec<&DocumentId> = ids.into_iter().collect();
        ordered.sort();

        let mut canonical = BTreeMap::new();
        for id in ordered {
            let Some(title) = id.title() else {
                continue;
            };
            let title = title.trim().to_string();
            if !filter.accepts(&title) {
                continue;
            }
            canonical.insert(title.to_lowercase(), title);
        }

        Self::from_map(canonical)
    }

    /// Build directly from titles, in the given order (later wins on collision).
    pub fn from_titles<I, S>(titles: I) -> Result<Self, LinkError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter = TitleFilter::default();
        let mut canonical = BTreeMap::new();
        for title in titles {
            let title: String = title.into();
            let title = title.trim().to_string();
            if filter.accepts(&title) {
                canonical.insert(title.to_lowercase(), title);
            }
        }
        Self::from_map(canonical)
    }

    fn from_map(canonical: BTreeMap<String, String>) -> Result<Self, LinkError> {
        let mut patterns = canonical
            .iter()
            .map(|(key, title)| TitlePattern::compile(key.clone(), title.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        // BTreeMap iteration is already key-ordered; a stable sort on length
        // keeps the key order as the tie-break.
        patterns.sort_by(|a, b| b.char_len.cmp(&a.char_len));

        Ok(Self {
            canonical,
            patterns,
        })
    }

    /// Canonical spelling for a title, looked up case-insensitively
    pub fn canonical(&self, title: &str) -> Option<&str> {
        self.canonical.get(&title.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.canonical.contains_key(&title.to_lowercase())
    }

    /// Patterns in matching order: longest first, ties by lowercase key
    pub fn patterns(&self) -> &[TitlePattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}
