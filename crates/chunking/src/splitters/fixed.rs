//! Fixed-size character windows.

use super::{ceil_char_boundary, floor_char_boundary, trim_span, ChunkSplitter, SplitContext};
use crate::chunk::Chunk;
use agentcore_core::AppResult;

/// Windows of `chunk_size` bytes that never end in the middle of a word
/// when the window contains whitespace to retract to.
pub struct FixedSizeSplitter;

/// Whether `idx` sits between two non-whitespace characters.
fn is_mid_word(text: &str, idx: usize) -> bool {
    let before = text[..idx].chars().next_back();
    let after = text[idx..].chars().next();
    matches!(
        (before, after),
        (Some(b), Some(a)) if !b.is_whitespace() && !a.is_whitespace()
    )
}

impl FixedSizeSplitter {
    /// End of the window starting at `start`, retracted to the last
    /// whitespace when the cut would land inside a word.
    fn window_end(text: &str, start: usize, size: usize) -> usize {
        let mut end = floor_char_boundary(text, start.saturating_add(size));
        if end <= start {
            // Window smaller than one character
            end = ceil_char_boundary(text, start + 1);
        }
        if end >= text.len() {
            return text.len();
        }

        if is_mid_word(text, end) {
            if let Some(pos) = text[start..end].rfind(char::is_whitespace) {
                if pos > 0 {
                    end = start + pos;
                }
            }
        }
        end
    }
}

impl ChunkSplitter for FixedSizeSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let size = ctx.chunk_size();
        let overlap = ctx.overlap();

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut prev_end = 0;

        while start < text.len() {
            let end = Self::window_end(text, start, size);
            let mut floor = start + 1;

            if let Some(span) = trim_span(text, (start, end)) {
                let chunk = ctx
                    .span_chunk(format!("chunk_{}", chunks.len()), text, span, "fixed_size")
                    .with_overlap(!chunks.is_empty() && span.0 < prev_end);
                chunks.push(chunk);
                prev_end = span.1;
                floor = floor.max(span.0 + 1);
            }

            if end >= text.len() {
                break;
            }
            start = ceil_char_boundary(text, end.saturating_sub(overlap).max(floor));
            // Overlap restarts at the next word rather than inside one
            if start < end && is_mid_word(text, start) {
                if let Some(pos) = text[start..end].find(char::is_whitespace) {
                    start += pos;
                }
            }
        }

        tracing::debug!(
            "Fixed-size splitter created {} chunks from {} bytes",
            chunks.len(),
            text.len()
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitters::test_support::Fixture;

    #[test]
    fn test_short_text_is_one_chunk() {
        let fixture = Fixture::new(1000, 0);
        let chunks = FixedSizeSplitter
            .split("  A short note.  ", &fixture.ctx())
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "A short note.");
        assert_eq!(chunks[0].id, "chunk_0");
    }

    #[test]
    fn test_never_cuts_mid_word() {
        let fixture = Fixture::new(12, 0);
        let text = "alpha beta gamma delta epsilon zeta";
        let chunks = FixedSizeSplitter.split(text, &fixture.ctx()).unwrap();
        let words: Vec<&str> = text.split(' ').collect();
        for chunk in &chunks {
            for word in chunk.content.split(' ') {
                assert!(words.contains(&word), "cut word: {:?}", word);
            }
        }
        let joined: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined.join(" "), text);
    }

    #[test]
    fn test_cuts_at_boundary_without_whitespace() {
        let fixture = Fixture::new(10, 0);
        let text = "x".repeat(25);
        let chunks = FixedSizeSplitter.split(&text, &fixture.ctx()).unwrap();
        let lengths: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(lengths, vec![10, 10, 5]);
    }

    #[test]
    fn test_overlap_and_forward_progress() {
        let fixture = Fixture::new(20, 8);
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let chunks = FixedSizeSplitter.split(text, &fixture.ctx()).unwrap();
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            assert!(pair[1].start_index > pair[0].start_index);
        }
        assert!(chunks.iter().skip(1).any(|c| c.overlap_with_previous));
        assert!(!chunks[0].overlap_with_previous);
    }

    #[test]
    fn test_multibyte_offsets_are_char_boundaries() {
        let fixture = Fixture::new(7, 2);
        let text = "héllo wörld ünïcode çhunks";
        let chunks = FixedSizeSplitter.split(text, &fixture.ctx()).unwrap();
        for chunk in &chunks {
            assert_eq!(&text[chunk.start_index..chunk.end_index], chunk.content);
        }
    }

    #[test]
    fn test_chunk_method_and_tokens() {
        let fixture = Fixture::new(50, 0);
        let chunks = FixedSizeSplitter
            .split("Tokens are counted per chunk.", &fixture.ctx())
            .unwrap();
        assert_eq!(chunks[0].metadata_str("chunk_method"), Some("fixed_size"));
        assert!(chunks[0].token_count.unwrap() > 0);
    }
}
