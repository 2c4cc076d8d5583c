//! Sliding windows advanced by a fixed stride.

use super::{ceil_char_boundary, floor_char_boundary, ChunkSplitter, SplitContext};
use crate::chunk::Chunk;
use agentcore_core::AppResult;

/// Raw `chunk_size` windows every `stride` bytes; windows are not trimmed.
pub struct SlidingWindowSplitter;

impl ChunkSplitter for SlidingWindowSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let size = ctx.chunk_size().max(1);
        let stride = ctx.config.effective_stride();

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let mut end = floor_char_boundary(text, start + size);
            if end <= start {
                end = ceil_char_boundary(text, start + 1);
            }

            if !text[start..end].trim().is_empty() {
                let overlaps = chunks.last().is_some_and(|prev| start < prev.end_index);
                chunks.push(
                    ctx.span_chunk(
                        format!("window_chunk_{}", chunks.len()),
                        text,
                        (start, end),
                        "sliding_window",
                    )
                    .with_overlap(overlaps),
                );
            }

            if end >= text.len() {
                break;
            }
            start = ceil_char_boundary(text, start + stride);
        }

        tracing::debug!(
            "Sliding window splitter created {} chunks (stride {})",
            chunks.len(),
            stride
        );

        Ok(chunks)
    }
}
