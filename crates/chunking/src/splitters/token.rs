//! Token windows.

use super::{ChunkSplitter, SplitContext};
use crate::chunk::Chunk;
use crate::tokenizer::Tokenizer;
use agentcore_core::AppResult;

/// Windows of `chunk_size` tokens under the configured tokenizer.
///
/// Offsets accumulate the decoded length of each window edge's token run.
/// They are approximate: decoding is not guaranteed to be a left inverse of
/// arbitrary substrings for every tokenizer.
pub struct TokenSplitter;

/// First token position `>= from` such that `tokens[anchor..i]` decodes
/// cleanly, together with that decoded text. `anchor` must itself be a
/// clean boundary, so only the run after it is decoded.
fn decodable_boundary(
    tokenizer: &dyn Tokenizer,
    tokens: &[u32],
    anchor: usize,
    from: usize,
) -> AppResult<(usize, String)> {
    let mut i = from.clamp(anchor, tokens.len());
    loop {
        match tokenizer.decode(&tokens[anchor..i]) {
            Ok(decoded) => return Ok((i, decoded)),
            Err(e) if i >= tokens.len() => return Err(e),
            // Edge falls inside a multi-byte character
            Err(_) => i += 1,
        }
    }
}

impl ChunkSplitter for TokenSplitter {
    fn split(&self, text: &str, ctx: &SplitContext<'_>) -> AppResult<Vec<Chunk>> {
        let tokenizer = ctx.tokenizer;
        let tokens = tokenizer.encode(text);
        let size = ctx.chunk_size().max(1);
        let overlap = ctx.overlap();

        let mut chunks = Vec::new();
        let (mut start, mut start_char) = (0, 0);
        let mut prev_end: Option<usize> = None;

        while start < tokens.len() {
            let (end, content) = decodable_boundary(tokenizer, &tokens, start, start + size)?;
            let end_char = start_char + content.len();
            let window_len = end - start;

            if !content.trim().is_empty() {
                let overlaps = prev_end.is_some_and(|p| start < p);
                let span = (start_char.min(text.len()), end_char.min(text.len()));
                let chunk = ctx
                    .chunk(format!("token_chunk_{}", chunks.len()), content, span, "token_based")
                    .with_token_count(window_len)
                    .with_overlap(overlaps);
                chunks.push(chunk);
                prev_end = Some(end);
            }

            if end >= tokens.len() {
                break;
            }
            let overlap_tokens = overlap.min(window_len / 2);
            let next = (end - overlap_tokens).max(start + 1);
            let (next_start, skipped) = decodable_boundary(tokenizer, &tokens, start, next)?;
            start_char += skipped.len();
            start = next_start;
        }

        tracing::debug!(
            "Token splitter created {} chunks from {} tokens",
            chunks.len(),
            tokens.len()
        );

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splitters::test_support::Fixture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts how many tokens pass through `decode`.
    #[derive(Debug)]
    struct CountingTokenizer {
        inner: Arc<dyn Tokenizer>,
        decoded: AtomicUsize,
    }

    impl Tokenizer for CountingTokenizer {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn encode(&self, text: &str) -> Vec<u32> {
            self.inner.encode(text)
        }

        fn decode(&self, tokens: &[u32]) -> AppResult<String> {
            self.decoded.fetch_add(tokens.len(), Ordering::SeqCst);
            self.inner.decode(tokens)
        }
    }

    #[test]
    fn test_windows_respect_token_budget() {
        let fixture = Fixture::new(16, 0);
        let text = "Tokens are the unit of budgeting for language model calls. "
            .repeat(10)
            .trim_end()
            .to_string();
        let chunks = TokenSplitter.split(&text, &fixture.ctx()).unwrap();

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("token_chunk_{}", i));
            assert!(chunk.token_count.unwrap() <= 16);
            assert!(!chunk.overlap_with_previous);
        }
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_overlap_marks_chunks_and_advances() {
        let fixture = Fixture::new(10, 4);
        let text = "one two three four five six seven eight nine ten eleven twelve thirteen";
        let chunks = TokenSplitter.split(text, &fixture.ctx()).unwrap();

        assert!(chunks.len() > 1);
        assert!(chunks.iter().skip(1).all(|c| c.overlap_with_previous));
        for pair in chunks.windows(2) {
            assert!(pair[1].start_index > pair[0].start_index);
        }
    }

    #[test]
    fn test_offsets_follow_decoded_prefix() {
        let fixture = Fixture::new(5, 0);
        let text = "Offsets come from decoding the token prefix of each window.";
        let chunks = TokenSplitter.split(text, &fixture.ctx()).unwrap();
        for chunk in &chunks {
            assert_eq!(&text[chunk.start_index..chunk.end_index], chunk.content);
        }
    }

    #[test]
    fn test_multibyte_text_never_splits_characters() {
        let fixture = Fixture::new(1, 0);
        let text = "日本語のテキスト 🎮";
        let chunks = TokenSplitter.split(text, &fixture.ctx()).unwrap();
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined.replace(' ', ""), text.replace(' ', ""));
    }

    #[test]
    fn test_long_input_decodes_each_token_a_bounded_number_of_times() {
        let mut fixture = Fixture::new(32, 10);
        let counting = Arc::new(CountingTokenizer {
            inner: fixture.tokenizer.clone(),
            decoded: AtomicUsize::new(0),
        });
        fixture.tokenizer = counting.clone();

        let text = "Long inputs must not be decoded from the start for every window. "
            .repeat(60)
            .trim_end()
            .to_string();
        let token_total = counting.encode(&text).len();
        let chunks = TokenSplitter.split(&text, &fixture.ctx()).unwrap();

        assert!(chunks.len() > 10);
        let decoded = counting.decoded.load(Ordering::SeqCst);
        assert!(
            decoded <= 4 * token_total,
            "decoded {} tokens for a {} token input",
            decoded,
            token_total
        );
    }

    #[test]
    fn test_zero_overlap_windows_are_contiguous() {
        let fixture = Fixture::new(12, 0);
        let text = "Each window picks up exactly where the previous one stopped. "
            .repeat(8)
            .trim_end()
            .to_string();
        let chunks = TokenSplitter.split(&text, &fixture.ctx()).unwrap();

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_index, 0);
        assert_eq!(chunks.last().unwrap().end_index, text.len());
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start_index, pair[0].end_index);
        }
        for chunk in &chunks {
            assert_eq!(&text[chunk.start_index..chunk.end_index], chunk.content);
        }
    }
}
