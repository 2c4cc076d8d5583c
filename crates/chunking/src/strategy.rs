//! Chunking strategy identifiers.

use crate::detection::Language;
use agentcore_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Available chunking strategies.
///
/// Identifiers are snake-case (`fixed_size`, `token_based`, ...). The
/// code-aware strategy carries its language as `code_aware:<language>`;
/// a bare `code_aware` detects the language from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ChunkingStrategy {
    /// Character windows that retract to word boundaries
    FixedSize,
    /// Whole sentences packed up to the size limit
    Sentence,
    /// Blank-line separated paragraphs
    Paragraph,
    /// Token windows from the configured tokenizer
    TokenBased,
    /// Picks paragraph, sentence or token-based from text analysis
    Adaptive,
    /// Adjacent sentences grouped by embedding similarity
    Semantic,
    /// Fixed windows advanced by a stride
    SlidingWindow,
    /// Separator hierarchy from paragraphs down to characters
    Recursive,
    /// Heading-delimited markdown sections
    MarkdownAware,
    /// Top-level definitions of a programming language
    CodeAware(Language),
}

impl ChunkingStrategy {
    /// Every strategy identifier accepted by `FromStr`.
    pub const NAMES: &'static [&'static str] = &[
        "fixed_size",
        "sentence",
        "paragraph",
        "token_based",
        "adaptive",
        "semantic",
        "sliding_window",
        "recursive",
        "markdown_aware",
        "code_aware",
    ];

    /// Short name used in chunk ids and `chunk_method` metadata.
    pub fn method_name(&self) -> &'static str {
        match self {
            ChunkingStrategy::FixedSize => "fixed_size",
            ChunkingStrategy::Sentence => "sentence",
            ChunkingStrategy::Paragraph => "paragraph",
            ChunkingStrategy::TokenBased => "token_based",
            ChunkingStrategy::Adaptive => "adaptive",
            ChunkingStrategy::Semantic => "semantic",
            ChunkingStrategy::SlidingWindow => "sliding_window",
            ChunkingStrategy::Recursive => "recursive",
            ChunkingStrategy::MarkdownAware => "markdown_aware",
            ChunkingStrategy::CodeAware(_) => "code_aware",
        }
    }
}

impl FromStr for ChunkingStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let (name, argument) = match normalized.split_once(':') {
            Some((name, argument)) => (name.to_string(), Some(argument.to_string())),
            None => (normalized, None),
        };

        let strategy = match name.as_str() {
            "fixed_size" | "fixed" => ChunkingStrategy::FixedSize,
            "sentence" => ChunkingStrategy::Sentence,
            "paragraph" => ChunkingStrategy::Paragraph,
            "token_based" | "token" | "tokens" => ChunkingStrategy::TokenBased,
            "adaptive" => ChunkingStrategy::Adaptive,
            "semantic" => ChunkingStrategy::Semantic,
            "sliding_window" => ChunkingStrategy::SlidingWindow,
            "recursive" => ChunkingStrategy::Recursive,
            "markdown_aware" | "markdown" => ChunkingStrategy::MarkdownAware,
            "code_aware" | "code" => ChunkingStrategy::CodeAware(
                argument
                    .as_deref()
                    .map(Language::from_name)
                    .unwrap_or(Language::Unknown),
            ),
            _ => {
                return Err(AppError::InvalidStrategy(format!(
                    "Unknown chunking strategy: '{}'. Supported: {}",
                    s,
                    Self::NAMES.join(", ")
                )))
            }
        };

        if argument.is_some() && !matches!(strategy, ChunkingStrategy::CodeAware(_)) {
            return Err(AppError::InvalidStrategy(format!(
                "Strategy '{}' does not take an argument",
                s
            )));
        }

        Ok(strategy)
    }
}

impl std::fmt::Display for ChunkingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkingStrategy::CodeAware(language) => write!(f, "code_aware:{}", language),
            other => f.write_str(other.method_name()),
        }
    }
}

impl From<ChunkingStrategy> for String {
    fn from(strategy: ChunkingStrategy) -> Self {
        strategy.to_string()
    }
}

impl TryFrom<String> for ChunkingStrategy {
    type Error = AppError;

    fn try_from(value: String) -> AppResult<Self> {
        value.parse()
    }
}
