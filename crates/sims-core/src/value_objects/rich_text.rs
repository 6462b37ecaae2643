//! Split text into plain, mention, and URL spoiler segments for display.
//!
//! Mentions and bare URLs are detected independently, then merged left to
//! right. When two matches overlap, the one that starts first wins.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::mention::MENTION_RE;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>\[\]\{}|\\^`\x00-\x1f\x7f]+").expect("valid regex"));

/// Label shown in place of a URL until the reader reveals it
pub const SPOILER_LABEL: &str = "[link hidden, tap to reveal]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Mention,
    Url,
}

/// A detected match as a byte range into the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

/// A rendered piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    Mention { username: String },
    Spoiler { url: String, label: String },
}

/// Trim trailing punctuation that most likely ends the sentence
fn trim_url_trailing(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
}

fn overlaps(start: usize, end: usize, existing: &[Span]) -> bool {
    existing.iter().any(|s| start < s.end && end > s.start)
}

/// All non-overlapping mention and URL spans, ordered by position
pub fn find_spans(text: &str) -> Vec<Span> {
    let mut candidates: Vec<Span> = MENTION_RE
        .find_iter(text)
        .map(|m| Span {
            start: m.start(),
            end: m.end(),
            kind: SpanKind::Mention,
        })
        .collect();

    for m in URL_RE.find_iter(text) {
        let trimmed = trim_url_trailing(m.as_str());
        if trimmed.len() > m.as_str().find("://").map_or(0, |i| i + 3) {
            candidates.push(Span {
                start: m.start(),
                end: m.start() + trimmed.len(),
                kind: SpanKind::Url,
            });
        }
    }

    candidates.sort_by_key(|s| (s.start, s.end));

    let mut spans: Vec<Span> = Vec::with_capacity(candidates.len());
    for span in candidates {
        if !overlaps(span.start, span.end, &spans) {
            spans.push(span);
        }
    }
    spans
}

/// Render text into ordered segments
pub fn render_rich_text(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for span in find_spans(text) {
        if span.start > cursor {
            segments.push(Segment::Text {
                text: text[cursor..span.start].to_string(),
            });
        }
        let matched = &text[span.start..span.end];
        segments.push(match span.kind {
            SpanKind::Mention => Segment::Mention {
                username: matched.trim_start_matches('@').to_string(),
            },
            SpanKind::Url => Segment::Spoiler {
                url: matched.to_string(),
                label: SPOILER_LABEL.to_string(),
            },
        });
        cursor = span.end;
    }

    if cursor < text.len() {
        segments.push(Segment::Text {
            text: text[cursor..].to_string(),
        });
    }
    segments
}
