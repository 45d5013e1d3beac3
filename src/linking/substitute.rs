//! Link substitution engine
//!
//! Two steps over the original text:
//!
//! 1. Candidate generation: every whole-word, case-insensitive occurrence of
//!    every title that does not touch a protected region, in title order
//!    (longest first, ties by lowercase title) and then by position.
//! 2. Conflict resolution: candidates are accepted greedily in that order;
//!    one that overlaps an already accepted link is dropped.
//!
//! Accepted spans are then wrapped as `[[matched text]]` in a single splice.

use super::regions::extract_protected_regions;
use super::titles::TitleIndex;
use super::types::{LinkOccurrence, ProtectedRegions, Substitution};
use std::collections::BTreeMap;
use std::ops::Range;

pub const LINK_OPEN: &str = "[[";
pub const LINK_CLOSE: &str = "]]";

/// Per-document substitution options
#[derive(Debug, Clone, Default)]
pub struct SubstituteOptions {
    /// Lowercase title that must not be linked (the document's own title)
    pub exclude_title: Option<String>,
}

impl SubstituteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn excluding(mut self, title: &str) -> Self {
        self.exclude_title = Some(title.to_lowercase());
        self
    }

    fn excludes(&self, key: &str) -> bool {
        self.exclude_title.as_deref() == Some(key)
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    range: Range<usize>,
    /// Position of the title in the index's matching order
    rank: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_whole_word(text: &str, range: &Range<usize>) -> bool {
    let before = text[..range.start].chars().next_back();
    let after = text[range.end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Whether the span touches `[[` or `]]` on either side, complete link or not
fn touches_link_markup(text: &str, range: &Range<usize>) -> bool {
    let before = &text[..range.start];
    let after = &text[range.end..];
    before.ends_with(LINK_OPEN)
        || before.ends_with(LINK_CLOSE)
        || after.starts_with(LINK_CLOSE)
        || after.starts_with(LINK_OPEN)
}

/// Offset of the char after the one starting at `at`
fn next_char_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len(), |c| at + c.len_utf8())
}

fn generate_candidates(
    text: &str,
    index: &TitleIndex,
    regions: &ProtectedRegions,
    options: &SubstituteOptions,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for (rank, pattern) in index.patterns().iter().enumerate() {
        if options.excludes(&pattern.key) {
            continue;
        }

        let mut from = 0;
        while from < text.len() {
            let Some(found) = pattern.matcher().find_at(text, from) else {
                break;
            };
            let range = found.range();

            // Overlapping occurrences of one title are all kept; a later one
            // can still win if a longer title claims the earlier.
            from = next_char_boundary(text, range.start);
            if is_whole_word(text, &range)
                && !regions.overlaps(&range)
                && !touches_link_markup(text, &range)
            {
                candidates.push(Candidate { range, rank });
            }
        }
    }

    candidates
}

/// Accept candidates in order, skipping any that overlap an accepted one.
/// Returns accepted candidates keyed by start offset.
fn resolve_conflicts(candidates: Vec<Candidate>) -> BTreeMap<usize, Candidate> {
    let mut accepted: BTreeMap<usize, Candidate> = BTreeMap::new();

    for candidate in candidates {
        // Accepted spans are disjoint, so only the nearest one starting
        // before our end can overlap.
        let conflict = accepted
            .range(..candidate.range.end)
            .next_back()
            .is_some_and(|(_, prior)| prior.range.end > candidate.range.start);
        if !conflict {
            accepted.insert(candidate.range.start, candidate);
        }
    }

    accepted
}

/// Insert links into `text`, leaving `regions` untouched.
///
/// `regions` must have been computed on this exact text.
pub fn substitute_links_with(
    text: &str,
    index: &TitleIndex,
    regions: &ProtectedRegions,
    options: &SubstituteOptions,
) -> Substitution {
    let candidates = generate_candidates(text, index, regions, options);
    if candidates.is_empty() {
        return Substitution::unchanged(text);
    }

    let accepted = resolve_conflicts(candidates);
    let patterns = index.patterns();

    let extra = accepted.len() * (LINK_OPEN.len() + LINK_CLOSE.len());
    let mut output = String::with_capacity(text.len() + extra);
    let mut links = Vec::with_capacity(accepted.len());
    let mut cursor = 0;

    for candidate in accepted.into_values() {
        let Range { start, end } = candidate.range;
        let matched = &text[start..end];

        output.push_str(&text[cursor..start]);
        output.push_str(LINK_OPEN);
        output.push_str(matched);
        output.push_str(LINK_CLOSE);
        cursor = end;

        links.push(LinkOccurrence {
            start,
            end,
            matched: matched.to_string(),
            title: patterns[candidate.rank].canonical.clone(),
        });
    }
    output.push_str(&text[cursor..]);

    Substitution {
        text: output,
        changed: true,
        links,
    }
}

pub fn substitute_links(text: &str, index: &TitleIndex, regions: &ProtectedRegions) -> Substitution {
    substitute_links_with(text, index, regions, &SubstituteOptions::default())
}

/// Extract protected regions and substitute in one call.
pub fn link_text(text: &str, index: &TitleIndex, options: &SubstituteOptions) -> Substitution {
    let regions = extract_protected_regions(text);
    substitute_links_with(text, index, &regions, options)
}
