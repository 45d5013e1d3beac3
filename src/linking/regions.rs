//! Protected region extraction
//!
//! Finds the spans of a document that link insertion must never touch.
//! Each stage only claims bytes left unclaimed by the stages before it, so
//! the resulting set is disjoint:
//!
//! 1. Frontmatter (`---` block at the start of the document)
//! 2. Fenced code (``` or ~~~, unterminated fences run to end of document)
//! 3. Inline code
//! 4. Existing wiki-links (`[[...]]`, `![[...]]`)
//! 5. Markdown links, images and reference definitions
//! 6. Bare URLs
//!
//! Code and markdown links come from pulldown-cmark; wiki-links and
//! frontmatter are not CommonMark and are scanned by hand.

use super::types::{ProtectedRegion, ProtectedRegions, RegionKind};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Compute the protected regions of `text`. Offsets refer to `text` itself.
pub fn extract_protected_regions(text: &str) -> ProtectedRegions {
    let mut regions = ProtectedRegions::new();

    let body_start = match frontmatter_span(text) {
        Some(span) => {
            let end = span.end;
            regions.insert(ProtectedRegion::new(span.start, end, RegionKind::Frontmatter));
            end
        }
        None => 0,
    };

    let markdown = markdown_spans(&text[body_start..]);
    let shift = |span: &Range<usize>| span.start + body_start..span.end + body_start;

    for span in &markdown.fenced_code {
        protect(&mut regions, text.len(), shift(span), RegionKind::FencedCode);
    }
    for span in &markdown.inline_code {
        protect(&mut regions, text.len(), shift(span), RegionKind::InlineCode);
    }
    for gap in regions.gaps(text.len()) {
        for span in wikilink_spans(text, gap) {
            regions.insert(ProtectedRegion::new(span.start, span.end, RegionKind::ExistingLink));
        }
    }
    for span in &markdown.links {
        protect(&mut regions, text.len(), shift(span), RegionKind::MarkdownLink);
    }
    for gap in regions.gaps(text.len()) {
        for found in url_pattern().find_iter(&text[gap.clone()]) {
            let span = gap.start + found.start()..gap.start + found.end();
            regions.insert(ProtectedRegion::new(span.start, span.end, RegionKind::Url));
        }
    }

    regions
}

/// Claim the parts of `span` no earlier stage has claimed
fn protect(regions: &mut ProtectedRegions, len: usize, span: Range<usize>, kind: RegionKind) {
    for gap in regions.gaps(len) {
        let start = span.start.max(gap.start);
        let end = span.end.min(gap.end);
        if start < end {
            regions.insert(ProtectedRegion::new(start, end, kind));
        }
    }
}

/// A line of text with its absolute offsets
struct Line<'a> {
    /// End including the line terminator
    end: usize,
    content: &'a str,
}

fn lines_in(text: &str, range: Range<usize>) -> impl Iterator<Item = Line<'_>> {
    let base = range.start;
    text[range]
        .split_inclusive('\n')
        .scan(base, |offset, raw| {
            *offset += raw.len();
            let content = raw.trim_end_matches('\n').trim_end_matches('\r');
            Some(Line {
                end: *offset,
                content,
            })
        })
}

/// A delimiter line is `---`, optionally padded with whitespace on either side
fn is_frontmatter_delimiter(line: &str) -> bool {
    line.trim() == "---"
}

/// The whole frontmatter block, both delimiters included.
///
/// Only a document whose first line is `---` has frontmatter, and only if a
/// closing `---` line follows; otherwise nothing is protected.
fn frontmatter_span(text: &str) -> Option<Range<usize>> {
    let body_start = if text.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    };

    let mut lines = lines_in(text, body_start..text.len());
    let opening = lines.next()?;
    if !is_frontmatter_delimiter(opening.content) {
        return None;
    }

    lines
        .find(|line| is_frontmatter_delimiter(line.content))
        .map(|closing| 0..closing.end)
}

/// Spans reported by the markdown parser, relative to the parsed text
#[derive(Debug, Default)]
struct MarkdownSpans {
    fenced_code: Vec<Range<usize>>,
    inline_code: Vec<Range<usize>>,
    /// Inline, reference and autolinks, images, and link definitions
    links: Vec<Range<usize>>,
}

fn markdown_spans(body: &str) -> MarkdownSpans {
    let parser = Parser::new_ext(body, Options::all());
    let mut spans = MarkdownSpans::default();

    // Definitions (`[label]: url`) produce no events
    spans.links.extend(
        parser
            .reference_definitions()
            .iter()
            .map(|(_, def)| def.span.clone()),
    );

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => spans.fenced_code.push(range),
            Event::Code(_) => spans.inline_code.push(range),
            Event::Start(Tag::Link { .. }) | Event::Start(Tag::Image { .. }) => {
                spans.links.push(range)
            }
            _ => {}
        }
    }

    spans
}

fn line_end(text: &str, from: usize, end: usize) -> usize {
    text[from..end].find('\n').map_or(end, |pos| from + pos)
}

fn wikilink_spans(text: &str, gap: Range<usize>) -> Vec<Range<usize>> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut i = gap.start;

    while let Some(pos) = text[i..gap.end].find("[[") {
        let open = i + pos;
        let limit = line_end(text, open, gap.end);
        match text[open + 2..limit].find("]]") {
            Some(close) => {
                let start = if open > gap.start && bytes[open - 1] == b'!' {
                    open - 1
                } else {
                    open
                };
                let end = open + 2 + close + 2;
                spans.push(start..end);
                i = end;
            }
            None => i = open + 2,
        }
    }

    spans
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"https?://[^\s<>\[\]]+").expect("URL pattern is valid"))
}
