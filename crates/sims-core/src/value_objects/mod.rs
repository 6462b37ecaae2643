//! Value objects - immutable types and pure text processing

pub mod mention;
pub mod rich_text;
pub mod username;

pub use mention::extract_mentions;
pub use rich_text::{find_spans, render_rich_text, Segment, Span, SpanKind};
