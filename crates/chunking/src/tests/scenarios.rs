//! End-to-end scenarios for the chunker and processor.

use super::{chunker, numbered_chunks};
use crate::chunk::{Chunk, Metadata};
use crate::processor::ChunkProcessor;
use crate::strategy::ChunkingStrategy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_are_never_truncated() {
        let chunker = chunker(20, 0);
        let text = "The cat sat. The dog ran. The bird flew.";
        let result = chunker
            .chunk(text, ChunkingStrategy::Sentence, &Metadata::new())
            .unwrap();

        assert!((2..=3).contains(&result.total_chunks));
        let sentences = ["The cat sat.", "The dog ran.", "The bird flew."];
        for chunk in &result.chunks {
            assert!(chunk.content.ends_with('.'));
            assert!(sentences.iter().any(|s| chunk.content.starts_with(s)));
        }
        let combined: Vec<&str> = result.chunks.iter().map(|c| c.content.as_str()).collect();
        let combined = combined.join(" ");
        for sentence in sentences {
            assert!(combined.contains(sentence));
        }
    }

    #[test]
    fn test_empty_text_yields_empty_result() {
        let result = chunker(1000, 200)
            .chunk("", ChunkingStrategy::FixedSize, &Metadata::new())
            .unwrap();
        assert!(result.chunks.is_empty());
        assert_eq!(result.total_chunks, 0);
        assert_eq!(result.original_length, 0);
    }

    #[tokio::test]
    async fn test_every_chunk_failing_still_returns_result() {
        let processor = ChunkProcessor::new(4).unwrap();
        let chunks = numbered_chunks(3);

        let result = processor
            .process_sequential(&chunks, |chunk: Chunk| async move {
                chunk
                    .content
                    .len()
                    .checked_div(0)
                    .ok_or_else(|| "division by zero".to_string())
            })
            .await;

        assert_eq!(result.successful_count, 0);
        assert_eq!(result.failed_count, 3);
        for processed in &result.processed_chunks {
            assert!(!processed.error_message.as_deref().unwrap_or_default().is_empty());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_ids_line_up_with_jittered_delays() {
        let processor = ChunkProcessor::new(4).unwrap();
        let chunks = numbered_chunks(10);

        let transform = |chunk: Chunk| async move {
            // Jitter derived from the id, between 0 and 9 ms
            let jitter = chunk.id.bytes().map(u64::from).sum::<u64>() * 7 % 10;
            tokio::time::sleep(Duration::from_millis(jitter)).await;
            Ok::<_, String>(chunk.id)
        };

        let result = processor.process_parallel(&chunks, transform).await;
        let ids: Vec<&str> = result
            .processed_chunks
            .iter()
            .map(|p| p.original_chunk.id.as_str())
            .collect();
        let expected: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, expected);
        assert_eq!(result.successful_count, 10);
    }

    #[tokio::test]
    async fn test_flaky_transform_recovers_within_retries() {
        let processor = ChunkProcessor::new(2).unwrap();
        let attempts: Arc<Mutex<HashMap<String, u32>>> = Arc::new(Mutex::new(HashMap::new()));
        let counter = attempts.clone();

        let flaky_twice_then_ok = move |chunk: Chunk| {
            let attempt = {
                let mut attempts = counter.lock().unwrap();
                let entry = attempts.entry(chunk.id.clone()).or_insert(0);
                *entry += 1;
                *entry
            };
            async move {
                if attempt <= 2 {
                    Err(format!("attempt {} failed", attempt))
                } else {
                    Ok(chunk.content)
                }
            }
        };

        let result = processor
            .process_with_retry(&numbered_chunks(1), flaky_twice_then_ok, 3, Duration::ZERO)
            .await;

        assert_eq!(result.successful_count, 1);
        assert_eq!(result.failed_count, 0);
        assert_eq!(attempts.lock().unwrap().get("c1"), Some(&3));
    }

    #[test]
    fn test_adaptive_picks_paragraphs_for_short_paragraph_text() {
        let paragraph = "This paragraph talks about one small idea and stays short. \
            It has a couple of sentences so the analysis sees real structure. \
            Then it ends, and nothing else follows.";
        let text = vec![paragraph; 20].join("\n\n");
        assert!(text.len() >= 3000);

        let result = chunker(1000, 200)
            .chunk(&text, ChunkingStrategy::Adaptive, &Metadata::new())
            .unwrap();

        assert_eq!(result.strategy_used, ChunkingStrategy::Paragraph);
        assert_eq!(result.total_chunks, 20);
        assert_eq!(
            result.metadata.get("adaptive_choice").and_then(|v| v.as_str()),
            Some("paragraph")
        );
    }
}
