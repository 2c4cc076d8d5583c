//! Text analysis behind the adaptive strategy.

use crate::splitters::paragraph_separator;
use crate::strategy::ChunkingStrategy;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn sentence_terminators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").unwrap())
}

/// Structural measurements of a text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAnalysis {
    pub paragraph_count: usize,
    pub sentence_count: usize,
    pub avg_paragraph_length: f64,
    pub avg_sentence_length: f64,
    pub total_length: usize,
}

impl TextAnalysis {
    /// More than one paragraph, and fewer than one per hundred bytes.
    pub fn has_clear_paragraphs(&self) -> bool {
        self.paragraph_count > 1 && (self.paragraph_count as f64) < self.total_length as f64 / 100.0
    }

    /// More than five sentences.
    pub fn has_clear_sentences(&self) -> bool {
        self.sentence_count > 5
    }
}

fn trimmed_lengths<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<usize> {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::len)
        .collect()
}

fn average(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
    }
}

/// Measure paragraphs (blank-line separated) and sentences (`.`, `!`, `?` runs).
pub fn analyze(text: &str) -> TextAnalysis {
    let paragraphs = trimmed_lengths(paragraph_separator().split(text));
    let sentences = trimmed_lengths(sentence_terminators().split(text));

    TextAnalysis {
        paragraph_count: paragraphs.len(),
        sentence_count: sentences.len(),
        avg_paragraph_length: average(&paragraphs),
        avg_sentence_length: average(&sentences),
        total_length: text.len(),
    }
}

/// Pick a concrete strategy, first matching rule wins:
/// paragraph when paragraphs are clear and average under 1.5x `chunk_size`,
/// sentence when sentences are clear and average under half of `chunk_size`,
/// token-based otherwise.
pub fn select_strategy(analysis: &TextAnalysis, chunk_size: usize) -> ChunkingStrategy {
    let size = chunk_size as f64;
    if analysis.has_clear_paragraphs() && analysis.avg_paragraph_length < size * 1.5 {
        ChunkingStrategy::Paragraph
    } else if analysis.has_clear_sentences() && analysis.avg_sentence_length < size / 2.0 {
        ChunkingStrategy::Sentence
    } else {
        ChunkingStrategy::TokenBased
    }
}
