//! Splitter implementations, one per chunking strategy.

mod code;
mod fixed;
mod markdown;
mod paragraph;
mod recursive;
mod semantic;
mod sentence;
mod sliding;
mod token;

pub use code::CodeSplitter;
pub use fixed::FixedSizeSplitter;
pub use markdown::MarkdownSplitter;
pub use paragraph::ParagraphSplitter;
pub use recursive::RecursiveSplitter;
pub use semantic::SemanticSplitter;
pub use sentence::SentenceSplitter;
pub use sliding::SlidingWindowSplitter;
pub use token::TokenSplitter;

pub(crate) use paragraph::paragraph_separator;
pub(crate) use recursive::recursive_spans;
pub(crate) use sentence::sentence_spans;

use crate::chunk::{Chunk, Metadata};
use crate::embedder::SentenceEmbedder;
use crate::strategy::ChunkingStrategy;
use crate::tokenizer::Tokenizer;
use agentcore_core::{AppError, AppResult, ChunkerConfig};

/// Byte range `(start, end)` into the source text.
pub type Span = (usize, usize);

/// Everything a splitter may read while segmenting one text.
#[derive(Debug, Clone, Copy)]
pub struct SplitContext<'a> {
    pub config: &'a ChunkerConfig,
    pub tokenizer: &'a dyn Tokenizer,
    pub embedder: &'a dyn SentenceEmbedder,
}

impl<'a> SplitContext<'a> {
    /// Target chunk size.
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Configured overlap.
    pub fn overlap(&self) -> usize {
        self.config.overlap
    }

    /// Build a chunk with `chunk_method` metadata and a token count.
    pub fn chunk(&self, id: String, content: String, span: Span, method: &str) -> Chunk {
        let mut metadata = Metadata::new();
        metadata.insert("chunk_method".to_string(), method.into());
        let token_count = self.tokenizer.count(&content);
        Chunk::new(id, content, span, metadata).with_token_count(token_count)
    }

    /// Build a chunk whose content is exactly `text[span]`.
    pub fn span_chunk(&self, id: String, text: &str, span: Span, method: &str) -> Chunk {
        self.chunk(id, text[span.0..span.1].to_string(), span, method)
    }
}

/// Trait for chunk splitters.
pub trait ChunkSplitter {
    /// Split text into chunks. Empty or whitespace-only spans are never emitted.
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>>;
}

/// Select the splitter for a concrete strategy.
///
/// `Adaptive` is not a splitter of its own: it must be resolved to a
/// concrete strategy first (see [`crate::adaptive`]).
pub fn for_strategy(strategy: &ChunkingStrategy) -> AppResult<Box<dyn ChunkSplitter>> {
    let splitter: Box<dyn ChunkSplitter> = match strategy {
        ChunkingStrategy::FixedSize => Box::new(FixedSizeSplitter),
        ChunkingStrategy::Sentence => Box::new(SentenceSplitter),
        ChunkingStrategy::Paragraph => Box::new(ParagraphSplitter),
        ChunkingStrategy::TokenBased => Box::new(TokenSplitter),
        ChunkingStrategy::Semantic => Box::new(SemanticSplitter),
        ChunkingStrategy::SlidingWindow => Box::new(SlidingWindowSplitter),
        ChunkingStrategy::Recursive => Box::new(RecursiveSplitter),
        ChunkingStrategy::MarkdownAware => Box::new(MarkdownSplitter),
        ChunkingStrategy::CodeAware(language) => Box::new(CodeSplitter::new(*language)),
        ChunkingStrategy::Adaptive => {
            return Err(AppError::InvalidStrategy(
                "adaptive must be resolved to a concrete strategy before splitting".to_string(),
            ))
        }
    };
    Ok(splitter)
}

/// Largest char boundary `<= idx`.
pub(crate) fn floor_char_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary `>= idx`.
pub(crate) fn ceil_char_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Narrow `span` to exclude leading and trailing whitespace.
pub(crate) fn trim_span(text: &str, span: Span) -> Option<Span> {
    let slice = &text[span.0..span.1];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let start = span.0 + (slice.len() - slice.trim_start().len());
    Some((start, start + trimmed.len()))
}

/// Spans of the regions between matches of `separator`, trimmed, empties dropped.
pub(crate) fn split_spans(text: &str, separator: &regex::Regex) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    for m in separator.find_iter(text) {
        spans.extend(trim_span(text, (cursor, m.start())));
        cursor = m.end();
    }
    spans.extend(trim_span(text, (cursor, text.len())));
    spans
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::embedder::TrigramEmbedder;
    use crate::tokenizer::load_tokenizer;
    use std::sync::Arc;

    /// Owns what a `SplitContext` borrows.
    pub struct Fixture {
        pub config: ChunkerConfig,
        pub tokenizer: Arc<dyn Tokenizer>,
        pub embedder: TrigramEmbedder,
    }

    impl Fixture {
        pub fn new(chunk_size: usize, overlap: usize) -> Self {
            Self::with_config(ChunkerConfig::new(chunk_size, overlap))
        }

        pub fn with_config(config: ChunkerConfig) -> Self {
            Self {
                embedder: TrigramEmbedder::new(config.embedding_dimensions),
                config,
                tokenizer: load_tokenizer("gpt-3.5-turbo").unwrap(),
            }
        }

        pub fn ctx(&self) -> SplitContext<'_> {
            SplitContext {
                config: &self.config,
                tokenizer: self.tokenizer.as_ref(),
                embedder: &self.embedder,
            }
        }
    }
}
