//! Blank-line separated paragraphs.

use super::{split_spans, ChunkSplitter, SentenceSplitter, SplitContext};
use crate::chunk::Chunk;
use agentcore_core::AppResult;
use regex::Regex;
use std::sync::OnceLock;

pub(crate) fn paragraph_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

/// One chunk per paragraph; oversized paragraphs fall back to sentence packing.
pub struct ParagraphSplitter;

impl ChunkSplitter for ParagraphSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let size = ctx.chunk_size();
        let mut chunks = Vec::new();
        // Sub-chunks of a large paragraph consume one id number each
        let mut next_id = 0;

        for span in split_spans(text, paragraph_separator()) {
            if span.1 - span.0 <= size {
                chunks.push(
                    ctx.span_chunk(format!("para_chunk_{}", next_id), text, span, "paragraph")
                        .with_metadata("is_complete_paragraph", true),
                );
                next_id += 1;
                continue;
            }

            let pieces = SentenceSplitter::spans(text, span, size);
            tracing::debug!(
                "Paragraph at {}..{} exceeds {} bytes, split into {} sentence groups",
                span.0,
                span.1,
                size,
                pieces.len()
            );
            for (i, piece) in pieces.iter().enumerate() {
                let id = format!("para_chunk_{}_{}", next_id, i);
                chunks.push(
                    ctx.span_chunk(id, text, *piece, "sentence")
                        .with_metadata("large_paragraph", true),
                );
            }
            next_id += pieces.len();
        }

        tracing::debug!("Paragraph splitter created {} chunks", chunks.len());
        Ok(chunks)
    }
}
