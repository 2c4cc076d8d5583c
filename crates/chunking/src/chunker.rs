//! The chunking entry point.

use crate::adaptive::{analyze, select_strategy};
use crate::chunk::{ChunkingResult, Metadata};
use crate::embedder::{SentenceEmbedder, TrigramEmbedder};
use crate::splitters::{self, SplitContext};
use crate::strategy::ChunkingStrategy;
use crate::tokenizer::{load_tokenizer, Tokenizer};
use agentcore_core::{AppResult, ChunkerConfig};
use serde_json::Value;
use std::sync::Arc;

/// Splits text into chunks under a configured size, overlap and tokenizer.
///
/// A `Chunker` holds no mutable state; share it freely between threads.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
    default_strategy: ChunkingStrategy,
    tokenizer: Arc<dyn Tokenizer>,
    embedder: Arc<dyn SentenceEmbedder>,
}

impl Chunker {
    /// Validate `config` and load its tokenizer.
    ///
    /// An unknown `model_name` falls back to the default encoding; an
    /// unparseable `default_strategy` or invalid sizes are errors.
    pub fn new(config: ChunkerConfig) -> AppResult<Self> {
        config.validate()?;
        let default_strategy = config.default_strategy.parse()?;
        let tokenizer = load_tokenizer(&config.model_name)?;
        let embedder = Arc::new(TrigramEmbedder::new(config.embedding_dimensions));

        tracing::debug!(
            "Chunker ready (size: {}, overlap: {}, tokenizer: {})",
            config.chunk_size,
            config.overlap,
            tokenizer.name()
        );

        Ok(Self {
            config,
            default_strategy,
            tokenizer,
            embedder,
        })
    }

    /// Replace the tokenizer.
    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Replace the sentence embedder used by the semantic strategy.
    pub fn with_embedder(mut self, embedder: Arc<dyn SentenceEmbedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    pub fn default_strategy(&self) -> ChunkingStrategy {
        self.default_strategy
    }

    pub(crate) fn split_context(&self) -> SplitContext<'_> {
        SplitContext {
            config: &self.config,
            tokenizer: self.tokenizer.as_ref(),
            embedder: self.embedder.as_ref(),
        }
    }

    /// Chunk `text` with `strategy`, merging `metadata` into every chunk.
    ///
    /// `Adaptive` is resolved to paragraph, sentence or token-based; the
    /// result records the concrete choice in `strategy_used` and under
    /// `adaptive_choice`. Caller metadata wins over strategy annotations
    /// on key conflicts. Empty text yields no chunks.
    pub fn chunk(
        &self,
        text: &str,
        strategy: ChunkingStrategy,
        metadata: &Metadata,
    ) -> AppResult<ChunkingResult> {
        let adaptive_choice = match strategy {
            ChunkingStrategy::Adaptive => {
                let analysis = analyze(text);
                let chosen = select_strategy(&analysis, self.config.chunk_size);
                tracing::debug!("Adaptive analysis {:?} selected {}", analysis, chosen);
                Some(chosen)
            }
            _ => None,
        };
        let resolved = adaptive_choice.unwrap_or(strategy);

        let mut chunks = if text.is_empty() {
            Vec::new()
        } else {
            splitters::for_strategy(&resolved)?.split(text, &self.split_context())?
        };

        let mut result_metadata = Metadata::new();
        if let Some(choice) = adaptive_choice {
            result_metadata.insert("adaptive_choice".to_string(), choice.method_name().into());
        }
        result_metadata.extend(metadata.clone());

        for chunk in &mut chunks {
            chunk.metadata.extend(result_metadata.clone());
        }

        let result = ChunkingResult::new(chunks, resolved, text.len(), result_metadata);
        tracing::info!(
            "Created {} chunks with {} strategy (total tokens: {})",
            result.total_chunks,
            result.strategy_used,
            result.total_tokens
        );

        Ok(result)
    }

    /// Chunk with the configured default strategy and no metadata.
    pub fn chunk_text(&self, text: &str) -> AppResult<ChunkingResult> {
        self.chunk(text, self.default_strategy, &Metadata::new())
    }

    /// Chunk with a strategy given by identifier, e.g. `"sentence"` or
    /// `"code_aware:python"`. Unknown identifiers are an error.
    pub fn chunk_named(
        &self,
        text: &str,
        strategy: &str,
        metadata: &Metadata,
    ) -> AppResult<ChunkingResult> {
        let strategy: ChunkingStrategy = strategy.parse()?;
        self.chunk(text, strategy, metadata)
    }

    /// Chunk an API response by tokens.
    ///
    /// Strings are chunked as they are; any other JSON value is pretty
    /// printed first. Every chunk carries `content_type = "api_response"`.
    pub fn chunk_api_response(&self, response: &Value) -> AppResult<ChunkingResult> {
        let text = match response {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other)?,
        };

        let mut metadata = Metadata::new();
        metadata.insert("content_type".to_string(), "api_response".into());
        self.chunk(&text, ChunkingStrategy::TokenBased, &metadata)
    }
}
