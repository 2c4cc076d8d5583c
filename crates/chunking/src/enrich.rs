//! Retrieval enrichment of finished chunks.

use crate::chunk::Chunk;
use crate::chunker::Chunker;
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Longest first sentence used verbatim as a summary, in graphemes.
const SUMMARY_MAX: usize = 100;

/// Prefix used when a chunk has no sentence text at all, in graphemes.
const SUMMARY_FALLBACK: usize = 50;

/// SHA-256 of `text` as lowercase hex.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn grapheme_prefix(text: &str, count: usize) -> &str {
    match text.grapheme_indices(true).nth(count) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// One-line summary: the first sentence, or a truncated prefix of the
/// content when that sentence is too long or empty.
pub fn summarize(content: &str) -> String {
    let first_sentence = content
        .split(|c| matches!(c, '.' | '!' | '?'))
        .next()
        .unwrap_or_default()
        .trim();

    if first_sentence.graphemes(true).count() > SUMMARY_MAX {
        format!("{}...", grapheme_prefix(content, SUMMARY_MAX))
    } else if !first_sentence.is_empty() {
        first_sentence.to_string()
    } else {
        format!("{}...", grapheme_prefix(content, SUMMARY_FALLBACK))
    }
}

/// Copies of `chunks` with `summary`, `content_hash` and
/// `optimized_for_retrieval` metadata. Content and offsets are unchanged.
pub fn optimize_for_retrieval(chunks: &[Chunk]) -> Vec<Chunk> {
    chunks
        .iter()
        .map(|chunk| {
            chunk
                .clone()
                .with_metadata("summary", summarize(&chunk.content))
                .with_metadata("content_hash", content_hash(&chunk.content))
                .with_metadata("optimized_for_retrieval", true)
        })
        .collect()
}

impl Chunker {
    /// See [`optimize_for_retrieval`].
    pub fn optimize_for_retrieval(&self, chunks: &[Chunk]) -> Vec<Chunk> {
        let optimized = optimize_for_retrieval(chunks);
        tracing::debug!("Optimized {} chunks for retrieval", optimized.len());
        optimized
    }
}
