//! Markdown sections delimited by ATX headings.

use super::{recursive_spans, trim_span, ChunkSplitter, Span, SplitContext};
use crate::chunk::Chunk;
use agentcore_core::AppResult;
use regex::Regex;
use std::sync::OnceLock;

fn heading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+)$").unwrap())
}

/// A heading line and the section it governs.
#[derive(Debug)]
struct Section<'t> {
    /// Heading line span, `None` for text before the first heading
    heading: Option<Span>,
    level: usize,
    title: &'t str,
    span: Span,
}

fn sections(text: &str) -> Vec<Section<'_>> {
    let headings: Vec<(Span, usize, &str)> = heading_pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let line = caps.get(0)?;
            let hashes = caps.get(1)?;
            let title = caps.get(2)?;
            Some(((line.start(), line.end()), hashes.len(), title.as_str().trim()))
        })
        .collect();

    let mut sections = Vec::with_capacity(headings.len() + 1);
    if let Some(((first, _), _, _)) = headings.first() {
        if *first > 0 {
            sections.push(Section {
                heading: None,
                level: 0,
                title: "",
                span: (0, *first),
            });
        }
    }

    for (i, &(line, level, title)) in headings.iter().enumerate() {
        let end = headings.get(i + 1).map_or(text.len(), |next| next.0 .0);
        sections.push(Section {
            heading: Some(line),
            level,
            title,
            span: (line.0, end),
        });
    }
    sections
}

/// One chunk per heading section. Oversized sections are split recursively
/// and every piece is prefixed with its governing heading, unless the heading
/// alone leaves no room for body text under the chunk size.
pub struct MarkdownSplitter;

impl MarkdownSplitter {
    fn section_chunk(
        ctx: &SplitContext<'_>,
        id: String,
        content: String,
        span: Span,
        section: &Section<'_>,
    ) -> Chunk {
        let chunk = ctx.chunk(id, content, span, "markdown_aware");
        match section.heading {
            Some(_) => chunk
                .with_metadata("header_level", section.level)
                .with_metadata("header_title", section.title)
                .with_metadata("section_type", "markdown_section"),
            None => chunk.with_metadata("section_type", "preamble"),
        }
    }
}

impl ChunkSplitter for MarkdownSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let size = ctx.chunk_size();
        let overlap = ctx.overlap();
        let sections = sections(text);

        if sections.is_empty() {
            tracing::debug!("No markdown headings found, splitting recursively");
            let chunks = recursive_spans(text, (0, text.len()), size, overlap)
                .into_iter()
                .enumerate()
                .map(|(i, span)| {
                    ctx.span_chunk(format!("md_chunk_{}", i), text, span, "markdown_aware")
                        .with_metadata("section_type", "plain_text")
                })
                .collect();
            return Ok(chunks);
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        for section in &sections {
            let Some(span) = trim_span(text, section.span) else {
                continue;
            };

            if span.1 - span.0 <= size {
                let id = format!("md_chunk_{}", chunks.len());
                let content = text[span.0..span.1].to_string();
                chunks.push(Self::section_chunk(ctx, id, content, span, section));
                continue;
            }

            // A heading is repeated on every part only while it leaves room
            // for body text; otherwise the whole section is split as-is
            let prefix = section
                .heading
                .map(|line| text[line.0..line.1].trim())
                .filter(|heading| heading.len() + 2 < size);
            let (body, budget) = match (prefix, section.heading) {
                (Some(heading), Some(line)) => {
                    ((line.1, section.span.1), size - (heading.len() + 2))
                }
                _ => (span, size),
            };
            let pieces = recursive_spans(text, body, budget, overlap.min(budget / 2));

            tracing::debug!(
                "Markdown section '{}' exceeds {} bytes, split into {} parts",
                section.title,
                size,
                pieces.len()
            );
            let mut prev_end = None;
            for (part, piece) in pieces.into_iter().enumerate() {
                let content = match prefix {
                    Some(heading) => format!("{}\n\n{}", heading, &text[piece.0..piece.1]),
                    None => text[piece.0..piece.1].to_string(),
                };
                let id = format!("md_chunk_{}", chunks.len());
                let overlaps = prev_end.is_some_and(|end| piece.0 < end);
                chunks.push(
                    Self::section_chunk(ctx, id, content, piece, section)
                        .with_metadata("section_part", part)
                        .with_metadata("heading_repeated", prefix.is_some())
                        .with_overlap(overlaps),
                );
                prev_end = Some(piece.1);
            }
        }

        tracing::debug!(
            "Markdown splitter created {} chunks from {} sections",
            chunks.len(),
            sections.len()
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitters::test_support::Fixture;

    const DOC: &str = "Intro text before any heading.\n\n\
# Install\n\nRun the installer.\n\n\
## Configure\n\nEdit the config file.\n";

    #[test]
    fn test_sections_keep_headings() {
        let fixture = Fixture::new(200, 0);
        let chunks = MarkdownSplitter.split(DOC, &fixture.ctx()).unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].metadata_str("section_type"), Some("preamble"));
        assert_eq!(chunks[1].metadata_str("header_title"), Some("Install"));
        assert_eq!(chunks[1].metadata.get("header_level"), Some(&1.into()));
        assert_eq!(chunks[2].metadata_str("header_title"), Some("Configure"));
        assert!(chunks[2].content.starts_with("## Configure"));
        for chunk in &chunks {
            assert_eq!(&DOC[chunk.start_index..chunk.end_index], chunk.content);
        }
    }

    #[test]
    fn test_oversized_section_repeats_heading() {
        let fixture = Fixture::new(60, 0);
        let body = "Each step is explained in a sentence. ".repeat(6);
        let text = format!("## Steps\n\n{}", body);
        let chunks = MarkdownSplitter.split(&text, &fixture.ctx()).unwrap();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.content.starts_with("## Steps\n\n"));
            assert!(chunk.len() <= 60);
            assert_eq!(chunk.metadata.get("section_part"), Some(&i.into()));
            assert_eq!(chunk.metadata.get("heading_repeated"), Some(&true.into()));
            let body_part = &chunk.content["## Steps\n\n".len()..];
            assert_eq!(&text[chunk.start_index..chunk.end_index], body_part);
        }
    }

    #[test]
    fn test_heading_longer_than_chunk_size_is_not_repeated() {
        let fixture = Fixture::new(20, 0);
        let text = "## A heading longer than the chunk size\n\n\
            The body text of the section goes on for a while here.";
        let chunks = MarkdownSplitter.split(text, &fixture.ctx()).unwrap();

        assert!((2..10).contains(&chunks.len()), "got {} chunks", chunks.len());
        for chunk in &chunks {
            assert!(chunk.len() <= 20, "oversized chunk {:?}", chunk.content);
            assert!(chunk.content.trim().len() > 1);
            assert_eq!(&text[chunk.start_index..chunk.end_index], chunk.content);
            assert_eq!(chunk.metadata.get("heading_repeated"), Some(&false.into()));
            assert_eq!(
                chunk.metadata_str("header_title"),
                Some("A heading longer than the chunk size")
            );
        }
        let joined: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert!(joined.join(" ").contains("while here."));
    }

    #[test]
    fn test_without_headings_falls_back_to_recursive() {
        let fixture = Fixture::new(30, 0);
        let text = "Plain text only.\n\nNo headings in this document.";
        let chunks = MarkdownSplitter.split(text, &fixture.ctx()).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.metadata_str("section_type") == Some("plain_text")));
    }

    #[test]
    fn test_hash_without_space_is_not_heading() {
        assert!(sections("#hashtag is not a heading").is_empty());
    }
}
