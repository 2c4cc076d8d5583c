//! Chunk data model.

use crate::strategy::ChunkingStrategy;
use serde::{Deserialize, Serialize};

/// Open metadata mapping attached to chunks and results.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A span of source text plus metadata, the unit of downstream processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier unique within one chunking run (e.g. `sentence_chunk_3`)
    pub id: String,

    /// Chunk text, never empty
    pub content: String,

    /// Byte offset of the span start in the original text
    pub start_index: usize,

    /// Byte offset one past the span end in the original text
    pub end_index: usize,

    /// Strategy annotations merged with caller metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Token count under the configured tokenizer
    pub token_count: Option<usize>,

    /// True when this chunk repeats trailing content of the previous one
    #[serde(default)]
    pub overlap_with_previous: bool,
}

impl Chunk {
    /// Create a chunk covering `span` of the original text.
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        span: (usize, usize),
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            start_index: span.0,
            end_index: span.1,
            metadata,
            token_count: None,
            overlap_with_previous: false,
        }
    }

    /// Set the token count.
    pub fn with_token_count(mut self, token_count: usize) -> Self {
        self.token_count = Some(token_count);
        self
    }

    /// Mark whether this chunk overlaps its predecessor.
    pub fn with_overlap(mut self, overlap_with_previous: bool) -> Self {
        self.overlap_with_previous = overlap_with_previous;
        self
    }

    /// Insert a metadata entry, replacing any previous value for `key`.
    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Length of the content in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Look up a string metadata value.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Outcome of one chunking call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingResult {
    /// Chunks in text order
    pub chunks: Vec<Chunk>,

    /// Number of chunks
    pub total_chunks: usize,

    /// The concrete strategy that produced the chunks
    pub strategy_used: ChunkingStrategy,

    /// Byte length of the input text
    pub original_length: usize,

    /// Sum of the known chunk token counts
    pub total_tokens: usize,

    /// Caller metadata plus strategy-derived annotations
    #[serde(default)]
    pub metadata: Metadata,
}

impl ChunkingResult {
    /// Build a result, deriving the totals from `chunks`.
    pub fn new(
        chunks: Vec<Chunk>,
        strategy_used: ChunkingStrategy,
        original_length: usize,
        metadata: Metadata,
    ) -> Self {
        let total_tokens = chunks.iter().filter_map(|c| c.token_count).sum();
        Self {
            total_chunks: chunks.len(),
            chunks,
            strategy_used,
            original_length,
            total_tokens,
            metadata,
        }
    }

    /// Whether no chunks were produced.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
