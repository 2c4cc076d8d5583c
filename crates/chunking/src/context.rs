//! Chunking that keeps context markers at the head of their chunks.

use crate::chunk::{Chunk, ChunkingResult, Metadata};
use crate::chunker::Chunker;
use crate::splitters::{floor_char_boundary, recursive_spans, trim_span, Span, SplitContext};
use crate::strategy::ChunkingStrategy;
use agentcore_core::{AppError, AppResult};
use regex::RegexBuilder;
use std::cmp::Reverse;

/// Case-insensitive marker occurrences in text order, with overlapping hits
/// dropped. Of hits starting at the same offset, the longest wins.
fn find_markers<'m>(text: &str, markers: &[&'m str]) -> AppResult<Vec<(Span, &'m str)>> {
    let mut hits = Vec::new();
    for &marker in markers {
        if marker.trim().is_empty() {
            continue;
        }
        let pattern = RegexBuilder::new(&regex::escape(marker))
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                AppError::Chunking(format!("Invalid context marker '{}': {}", marker, e))
            })?;
        hits.extend(pattern.find_iter(text).map(|m| ((m.start(), m.end()), marker)));
    }
    hits.sort_by_key(|&((start, end), _)| (start, Reverse(end)));

    let mut kept: Vec<(Span, &str)> = Vec::with_capacity(hits.len());
    for hit in hits {
        if kept.last().map_or(true, |last| hit.0 .0 >= last.0 .1) {
            kept.push(hit);
        }
    }
    Ok(kept)
}

/// Emit recursive chunks for a gap between markers, tagging each one.
fn push_gap(
    chunks: &mut Vec<Chunk>,
    ctx: &SplitContext<'_>,
    text: &str,
    gap: Span,
    key: &str,
    value: serde_json::Value,
) {
    for span in recursive_spans(text, gap, ctx.chunk_size(), 0) {
        let id = format!("context_chunk_{}", chunks.len());
        chunks.push(
            ctx.span_chunk(id, text, span, "context_preserved")
                .with_metadata(key, value.clone()),
        );
    }
}

impl Chunker {
    /// Chunk so that every occurrence of a marker (matched
    /// case-insensitively) starts a fresh chunk together with up to
    /// `chunk_size` bytes of the content that follows it.
    ///
    /// Text before a marker and after the last one is split recursively.
    /// Without any marker hit this is plain adaptive chunking.
    pub fn chunk_with_context_markers(
        &self,
        text: &str,
        markers: &[&str],
    ) -> AppResult<ChunkingResult> {
        let hits = find_markers(text, markers)?;
        if hits.is_empty() {
            tracing::debug!("No context markers found, using adaptive chunking");
            return self.chunk(text, ChunkingStrategy::Adaptive, &Metadata::new());
        }

        let ctx = self.split_context();
        let size = self.config().chunk_size;
        let mut chunks = Vec::new();
        let mut cursor = 0;

        for (i, &(span, marker)) in hits.iter().enumerate() {
            if span.0 > cursor {
                let gap = (cursor, span.0);
                push_gap(&mut chunks, &ctx, text, gap, "before_marker", marker.into());
            }

            let next_marker = hits.get(i + 1).map_or(text.len(), |next| next.0 .0);
            let end = floor_char_boundary(text, (span.1 + size).min(next_marker)).max(span.1);
            if let Some(marker_span) = trim_span(text, (span.0, end)) {
                let id = format!("context_chunk_{}", chunks.len());
                chunks.push(
                    ctx.span_chunk(id, text, marker_span, "context_preserved")
                        .with_metadata("contains_marker", marker),
                );
            }
            cursor = end;
        }

        if cursor < text.len() {
            let tail = (cursor, text.len());
            push_gap(&mut chunks, &ctx, text, tail, "final_chunk", true.into());
        }

        let mut metadata = Metadata::new();
        metadata.insert("context_markers".to_string(), markers.to_vec().into());

        let result =
            ChunkingResult::new(chunks, ChunkingStrategy::Adaptive, text.len(), metadata);
        tracing::info!(
            "Created {} context-preserving chunks for {} marker hits",
            result.total_chunks,
            hits.len()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_core::ChunkerConfig;
    use serde_json::json;

    fn chunker(size: usize) -> Chunker {
        Chunker::new(ChunkerConfig::new(size, 0)).unwrap()
    }

    #[test]
    fn test_markers_start_chunks() {
        let text = "Preface text. SECTION A: alpha content. Section B: beta content. Tail.";
        let result = chunker(200)
            .chunk_with_context_markers(text, &["section a", "section b"])
            .unwrap();

        let contents: Vec<&str> = result.chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(
            contents,
            vec![
                "Preface text.",
                "SECTION A: alpha content.",
                "Section B: beta content. Tail."
            ]
        );
        assert_eq!(result.chunks[0].metadata_str("before_marker"), Some("section a"));
        assert_eq!(result.chunks[1].metadata_str("contains_marker"), Some("section a"));
        assert_eq!(result.chunks[2].metadata_str("contains_marker"), Some("section b"));
        assert_eq!(result.strategy_used, ChunkingStrategy::Adaptive);
        assert_eq!(
            result.metadata.get("context_markers"),
            Some(&json!(["section a", "section b"]))
        );
    }

    #[test]
    fn test_marker_chunk_is_bounded_and_tail_follows() {
        let text = "Intro: ".to_string() + &"word ".repeat(20);
        let result = chunker(20).chunk_with_context_markers(&text, &["intro:"]).unwrap();

        let first = &result.chunks[0];
        assert!(first.content.starts_with("Intro:"));
        assert!(first.end_index <= "Intro:".len() + 20);
        let tail: Vec<&Chunk> = result.chunks.iter().skip(1).collect();
        assert!(!tail.is_empty());
        assert!(tail
            .iter()
            .all(|c| c.metadata.get("final_chunk") == Some(&json!(true))));
        for chunk in &result.chunks {
            assert_eq!(&text[chunk.start_index..chunk.end_index], chunk.content);
        }
    }

    #[test]
    fn test_overlapping_marker_hits_are_skipped() {
        let hits = find_markers("Chapter One begins", &["chapter one", "one"]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1, "chapter one");
    }

    #[test]
    fn test_same_start_prefers_longest_marker() {
        let text = "Intro. Chapter One begins here.";
        let hits = find_markers(text, &["chapter", "chapter one"]).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1, "chapter one");
        assert_eq!(&text[hits[0].0 .0..hits[0].0 .1], "Chapter One");

        let result = chunker(200)
            .chunk_with_context_markers(text, &["chapter", "chapter one"])
            .unwrap();
        let marked: Vec<&str> = result
            .chunks
            .iter()
            .filter_map(|c| c.metadata_str("contains_marker"))
            .collect();
        assert_eq!(marked, vec!["chapter one"]);
    }

    #[test]
    fn test_no_hits_falls_back_to_adaptive() {
        let text = "Nothing to find here. Just prose.";
        let result = chunker(100).chunk_with_context_markers(text, &["missing"]).unwrap();
        assert!(result.metadata.contains_key("adaptive_choice"));
        assert!(!result.chunks.is_empty());
    }
}
