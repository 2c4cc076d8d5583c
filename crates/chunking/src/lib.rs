//! Text chunking and chunk processing for AgentCore.
//!
//! Two halves:
//! - [`Chunker`] splits text into [`Chunk`]s with one of several strategies
//!   (fixed-size, sentence, paragraph, token, semantic, sliding window,
//!   recursive, markdown, code-aware, or adaptive selection among them).
//! - [`ChunkProcessor`] applies an async transform to every chunk
//!   sequentially, in parallel under a worker bound, in streaming batches,
//!   or with retries, and can aggregate the successful outputs.

pub mod adaptive;
pub mod chunk;
pub mod chunker;
pub mod context;
pub mod detection;
pub mod embedder;
pub mod enrich;
pub mod processor;
pub mod splitters;
pub mod strategy;
pub mod tokenizer;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use adaptive::{analyze, select_strategy, TextAnalysis};
pub use chunk::{Chunk, ChunkingResult, Metadata};
pub use chunker::Chunker;
pub use detection::{detect_language_from_content, Language};
pub use embedder::{cosine_similarity, SentenceEmbedder, TrigramEmbedder};
pub use processor::factories::{AnalysisKind, CompletionClient};
pub use processor::{splice_retries, ChunkProcessingResult, ChunkProcessor, ProcessedChunk};
pub use strategy::ChunkingStrategy;
pub use tokenizer::{load_tokenizer, TiktokenTokenizer, Tokenizer};
