//! Crate-level tests exercising the chunker and processor together.

mod scenarios;

use crate::chunk::{Chunk, Metadata};
use crate::chunker::Chunker;
use agentcore_core::ChunkerConfig;

/// Chunker with the given size and overlap and default everything else.
pub(crate) fn chunker(chunk_size: usize, overlap: usize) -> Chunker {
    Chunker::new(ChunkerConfig::new(chunk_size, overlap)).unwrap()
}

/// `count` chunks with ids `c1..=c<count>`.
pub(crate) fn numbered_chunks(count: usize) -> Vec<Chunk> {
    (1..=count)
        .map(|i| {
            let content = format!("chunk number {}", i);
            let span = (0, content.len());
            Chunk::new(format!("c{}", i), content, span, Metadata::new())
        })
        .collect()
}

/// Text with every whitespace character removed.
pub(crate) fn without_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

pub(crate) const SAMPLE_TEXT: &str = "Chunking splits long documents into pieces \
    that fit a model's context. Each piece should stand on its own! Otherwise retrieval \
    returns fragments that make no sense.\n\n\
    Sentence boundaries are a good first guess. Paragraph boundaries are better when the \
    author used them. Token windows are the fallback when neither is clear?\n\n\
    Overlap repeats a little context between neighbours. It costs storage but helps recall. \
    Too much overlap wastes tokens, too little loses the thread.\n\n\
    Finally, every chunk records where it came from so answers can cite their sources.";
