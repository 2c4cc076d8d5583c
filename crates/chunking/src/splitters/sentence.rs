//! Sentence packing.

use super::{trim_span, ChunkSplitter, Span, SplitContext};
use crate::chunk::Chunk;
use agentcore_core::AppResult;
use regex::Regex;
use std::sync::OnceLock;

fn sentence_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]\s+").unwrap())
}

/// Sentence spans inside `within`, in order.
///
/// A sentence ends right after `.`, `!` or `?` when whitespace follows;
/// the whitespace itself belongs to neither sentence.
pub(crate) fn sentence_spans(text: &str, within: Span) -> Vec<Span> {
    let slice = &text[within.0..within.1];
    let mut spans = Vec::new();
    let mut cursor = 0;

    for m in sentence_boundary().find_iter(slice) {
        // Punctuation is one byte
        let end = m.start() + 1;
        spans.extend(trim_span(text, (within.0 + cursor, within.0 + end)));
        cursor = m.end();
    }
    spans.extend(trim_span(text, (within.0 + cursor, within.1)));
    spans
}

/// Running group of adjacent spans, threaded through a fold.
#[derive(Debug, Default)]
struct SpanAccumulator {
    groups: Vec<Span>,
    current: Option<Span>,
}

impl SpanAccumulator {
    /// Add `span`, flushing the open group first when the group would grow
    /// past `limit`. A lone span larger than `limit` still forms a group.
    fn push(mut self, span: Span, limit: usize) -> Self {
        self.current = match self.current {
            Some(open) if span.1 - open.0 > limit => {
                self.groups.push(open);
                Some(span)
            }
            Some((start, _)) => Some((start, span.1)),
            None => Some(span),
        };
        self
    }

    fn finish(mut self) -> Vec<Span> {
        self.groups.extend(self.current);
        self.groups
    }
}

/// Pack ordered spans into groups whose extent stays within `limit`.
pub(crate) fn pack_spans(spans: &[Span], limit: usize) -> Vec<Span> {
    spans
        .iter()
        .fold(SpanAccumulator::default(), |acc, &span| acc.push(span, limit))
        .finish()
}

/// Whole sentences packed into chunks of at most `chunk_size` bytes.
pub struct SentenceSplitter;

impl SentenceSplitter {
    /// Sentence-packed spans of `text[within]`.
    pub(crate) fn spans(text: &str, within: Span, limit: usize) -> Vec<Span> {
        pack_spans(&sentence_spans(text, within), limit)
    }
}

impl ChunkSplitter for SentenceSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let chunks: Vec<Chunk> = Self::spans(text, (0, text.len()), ctx.chunk_size())
            .into_iter()
            .enumerate()
            .map(|(i, span)| {
                ctx.span_chunk(format!("sentence_chunk_{}", i), text, span, "sentence")
            })
            .collect();

        tracing::debug!("Sentence splitter created {} chunks", chunks.len());
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitters::test_support::Fixture;

    #[test]
    fn test_sentence_spans() {
        let text = "First one. Second one!  Third? tail";
        let spans = sentence_spans(text, (0, text.len()));
        let parts: Vec<&str> = spans.iter().map(|&(s, e)| &text[s..e]).collect();
        assert_eq!(parts, vec!["First one.", "Second one!", "Third?", "tail"]);
    }

    #[test]
    fn test_decimal_point_is_not_a_boundary() {
        let text = "Pi is 3.14 roughly. Done.";
        let spans = sentence_spans(text, (0, text.len()));
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_pack_spans_flushes_on_overflow() {
        let spans = vec![(0, 5), (6, 11), (12, 30), (31, 33)];
        assert_eq!(pack_spans(&spans, 12), vec![(0, 11), (12, 30), (31, 33)]);
        assert!(pack_spans(&[], 10).is_empty());
    }

    #[test]
    fn test_three_short_sentences() {
        let fixture = Fixture::new(20, 0);
        let text = "The cat sat. The dog ran. The bird flew.";
        let chunks = SentenceSplitter.split(text, &fixture.ctx()).unwrap();

        assert!((2..=3).contains(&chunks.len()));
        for chunk in &chunks {
            assert!(chunk.content.ends_with('.'));
        }
        let combined: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let combined = combined.join(" ");
        for sentence in ["The cat sat.", "The dog ran.", "The bird flew."] {
            assert!(combined.contains(sentence));
        }
    }

    #[test]
    fn test_content_matches_offsets() {
        let fixture = Fixture::new(40, 0);
        let text = "Alpha goes first. Beta follows closely! Gamma asks why? Delta ends it.";
        let chunks = SentenceSplitter.split(text, &fixture.ctx()).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("sentence_chunk_{}", i));
            assert_eq!(&text[chunk.start_index..chunk.end_index], chunk.content);
            assert_eq!(chunk.metadata_str("chunk_method"), Some("sentence"));
        }
    }
}
