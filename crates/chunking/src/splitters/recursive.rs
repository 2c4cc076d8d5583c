//! Recursive separator-hierarchy splitting.

use super::{ceil_char_boundary, floor_char_boundary, trim_span, ChunkSplitter, Span, SplitContext};
use crate::chunk::Chunk;
use agentcore_core::AppResult;

/// Separators tried from coarsest to finest before falling back to a hard cut.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", "; ", ", ", " "];

/// Break `span` into contiguous pieces no larger than `size`.
///
/// Each separator stays attached to the piece it terminates, so the pieces
/// tile `span` exactly.
fn atomize(text: &str, span: Span, size: usize, level: usize, out: &mut Vec<Span>) {
    if span.1 - span.0 <= size {
        out.push(span);
        return;
    }

    let Some(separator) = SEPARATORS.get(level) else {
        let mut start = span.0;
        while start < span.1 {
            let mut end = floor_char_boundary(text, (start + size).min(span.1));
            if end <= start {
                end = ceil_char_boundary(text, start + 1);
            }
            out.push((start, end));
            start = end;
        }
        return;
    };

    let mut parts = Vec::new();
    let mut cursor = span.0;
    for (idx, _) in text[span.0..span.1].match_indices(separator) {
        let end = span.0 + idx + separator.len();
        if end > cursor && end < span.1 {
            parts.push((cursor, end));
            cursor = end;
        }
    }
    if cursor < span.1 {
        parts.push((cursor, span.1));
    }

    if parts.len() <= 1 {
        atomize(text, span, size, level + 1, out);
    } else {
        for part in parts {
            atomize(text, part, size, level + 1, out);
        }
    }
}

/// Greedily pack pieces into groups of at most `size` bytes.
///
/// With overlap, the next group restarts at the earliest piece boundary
/// that lies within `overlap` bytes of the previous group's end and still
/// leaves room for the following piece.
fn merge(pieces: &[Span], size: usize, overlap: usize) -> Vec<Span> {
    let mut groups = Vec::new();
    let mut i = 0;

    while i < pieces.len() {
        let start = pieces[i].0;
        let mut j = i;
        while j + 1 < pieces.len() && pieces[j + 1].1 - start <= size {
            j += 1;
        }
        groups.push((start, pieces[j].1));

        if j + 1 >= pieces.len() {
            break;
        }
        let restart = (overlap > 0)
            .then(|| {
                (i + 1..=j).find(|&k| {
                    pieces[j].1 - pieces[k].0 <= overlap && pieces[j + 1].1 - pieces[k].0 <= size
                })
            })
            .flatten();
        i = restart.unwrap_or(j + 1);
    }

    groups
}

/// Trimmed chunk spans of `text[span]` under the recursive strategy.
pub(crate) fn recursive_spans(text: &str, span: Span, size: usize, overlap: usize) -> Vec<Span> {
    let size = size.max(1);
    let mut pieces = Vec::new();
    atomize(text, span, size, 0, &mut pieces);
    merge(&pieces, size, overlap)
        .into_iter()
        .filter_map(|group| trim_span(text, group))
        .collect()
}

/// Paragraphs, then lines, sentences, clauses and words, then characters.
pub struct RecursiveSplitter;

impl ChunkSplitter for RecursiveSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let spans = recursive_spans(text, (0, text.len()), ctx.chunk_size(), ctx.overlap());

        let mut chunks: Vec<Chunk> = Vec::with_capacity(spans.len());
        for (i, span) in spans.into_iter().enumerate() {
            let overlaps = chunks.last().is_some_and(|prev| span.0 < prev.end_index);
            chunks.push(
                ctx.span_chunk(format!("recursive_chunk_{}", i), text, span, "recursive")
                    .with_overlap(overlaps),
            );
        }

        tracing::debug!("Recursive splitter created {} chunks", chunks.len());
        Ok(chunks)
    }
}
