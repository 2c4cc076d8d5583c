//! Ready-made transforms that send each chunk through a completion model.
//!
//! The processor is model-agnostic; these factories only need something that
//! implements [`CompletionClient`]. No concrete provider lives in this crate.

use crate::chunk::Chunk;
use agentcore_core::{AppError, AppResult};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

/// Placeholder replaced by the chunk content in prompt templates.
pub const CONTENT_PLACEHOLDER: &str = "{content}";

pub const SUMMARIZATION_TEMPLATE: &str =
    "Summarize the following text in 2-3 sentences, focusing on the main points:\n\n{content}\n\nSummary:";

/// Text completion backend used by the transform factories.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Provider name used in logs (e.g., "ollama", "openai").
    fn provider_name(&self) -> &str;

    /// Complete `prompt` and return the generated text.
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

/// Kind of analysis requested from [`analysis_transform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Sentiment,
    Topics,
    Keywords,
    General,
}

impl AnalysisKind {
    /// Parse a kind name; anything unrecognised is `General`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "sentiment" => Self::Sentiment,
            "topics" => Self::Topics,
            "keywords" => Self::Keywords,
            _ => Self::General,
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Self::Sentiment => {
                "Analyze the sentiment of this text and provide a brief explanation:\n\n{content}\n\nSentiment Analysis:"
            }
            Self::Topics => "Identify the main topics discussed in this text:\n\n{content}\n\nMain Topics:",
            Self::Keywords => "Extract key terms and phrases from this text:\n\n{content}\n\nKey Terms:",
            Self::General => "Analyze this text and provide key insights:\n\n{content}\n\nAnalysis:",
        }
    }
}

/// Substitute the chunk content into `template`.
pub fn render_prompt(template: &str, content: &str) -> String {
    template.replace(CONTENT_PLACEHOLDER, content)
}

/// Transform that renders `template` with each chunk's content and returns
/// the model's completion.
///
/// Client failures are reported as `Processing` errors prefixed with
/// `LLM processing failed:`.
pub fn llm_transform<C>(
    client: Arc<C>,
    template: impl Into<String>,
) -> impl Fn(Chunk) -> BoxFuture<'static, AppResult<String>> + Send + Sync + 'static
where
    C: CompletionClient + ?Sized + 'static,
{
    let template: Arc<str> = Arc::from(template.into());
    move |chunk: Chunk| {
        let client = client.clone();
        let prompt = render_prompt(&template, &chunk.content);
        async move {
            tracing::debug!(
                "Sending chunk {} to {} ({} bytes of prompt)",
                chunk.id,
                client.provider_name(),
                prompt.len()
            );
            client
                .complete(&prompt)
                .await
                .map_err(|e| AppError::Processing(format!("LLM processing failed: {}", e)))
        }
        .boxed()
    }
}

/// Two-to-three sentence summary of each chunk.
pub fn summarization_transform<C>(
    client: Arc<C>,
) -> impl Fn(Chunk) -> BoxFuture<'static, AppResult<String>> + Send + Sync + 'static
where
    C: CompletionClient + ?Sized + 'static,
{
    llm_transform(client, SUMMARIZATION_TEMPLATE)
}

/// Sentiment, topic, keyword or general analysis of each chunk.
pub fn analysis_transform<C>(
    client: Arc<C>,
    kind: AnalysisKind,
) -> impl Fn(Chunk) -> BoxFuture<'static, AppResult<String>> + Send + Sync + 'static
where
    C: CompletionClient + ?Sized + 'static,
{
    llm_transform(client, kind.template())
}

/// Translation of each chunk into `language`.
pub fn translation_transform<C>(
    client: Arc<C>,
    language: &str,
) -> impl Fn(Chunk) -> BoxFuture<'static, AppResult<String>> + Send + Sync + 'static
where
    C: CompletionClient + ?Sized + 'static,
{
    let template = format!(
        "Translate the following text to {}:\n\n{}\n\nTranslation:",
        language, CONTENT_PLACEHOLDER
    );
    llm_transform(client, template)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Metadata;
    use crate::processor::ChunkProcessor;
    use std::sync::Mutex;

    /// Records prompts and echoes them back, failing on demand.
    #[derive(Default)]
    struct MockClient {
        prompts: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl CompletionClient for MockClient {
        fn provider_name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, prompt: &str) -> AppResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.fail_on {
                Some(needle) if prompt.contains(needle) => {
                    Err(AppError::Other("connection refused".to_string()))
                }
                _ => Ok(format!("reply to {} bytes", prompt.len())),
            }
        }
    }

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk::new(id, content, (0, content.len()), Metadata::new())
    }

    #[test]
    fn test_render_prompt() {
        assert_eq!(render_prompt("Q: {content}?", "why"), "Q: why?");
        assert_eq!(render_prompt("no placeholder", "why"), "no placeholder");
    }

    #[test]
    fn test_analysis_kind_fallback() {
        assert_eq!(AnalysisKind::from_name("Sentiment"), AnalysisKind::Sentiment);
        assert_eq!(AnalysisKind::from_name("topics"), AnalysisKind::Topics);
        assert_eq!(AnalysisKind::from_name("keywords"), AnalysisKind::Keywords);
        assert_eq!(AnalysisKind::from_name("vibes"), AnalysisKind::General);
    }

    #[tokio::test]
    async fn test_summarization_prompt() {
        let client = Arc::new(MockClient::default());
        let transform = summarization_transform(client.clone());

        let reply = transform(chunk("c0", "Rust has no garbage collector.")).await.unwrap();
        assert!(reply.starts_with("reply to"));

        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("Summarize the following text in 2-3 sentences"));
        assert!(prompts[0].contains("\n\nRust has no garbage collector.\n\nSummary:"));
    }

    #[tokio::test]
    async fn test_translation_prompt_names_language() {
        let client = Arc::new(MockClient::default());
        let transform = translation_transform(client.clone(), "French");
        transform(chunk("c0", "Good morning")).await.unwrap();

        let prompts = client.prompts.lock().unwrap();
        assert_eq!(
            prompts[0],
            "Translate the following text to French:\n\nGood morning\n\nTranslation:"
        );
    }

    #[tokio::test]
    async fn test_client_errors_are_wrapped() {
        let client = Arc::new(MockClient {
            fail_on: Some("broken"),
            ..Default::default()
        });
        let transform = analysis_transform(client, AnalysisKind::Keywords);

        let err = transform(chunk("c0", "broken chunk")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Processing(ref msg) if msg.starts_with("LLM processing failed: ")
        ));
    }

    #[tokio::test]
    async fn test_factories_plug_into_processor() {
        let client: Arc<dyn CompletionClient> = Arc::new(MockClient {
            fail_on: Some("broken"),
            ..Default::default()
        });
        let processor = ChunkProcessor::new(2).unwrap();
        let chunks = vec![chunk("c0", "fine text"), chunk("c1", "broken text")];

        let result = processor
            .process_parallel(&chunks, analysis_transform(client, AnalysisKind::Topics))
            .await;

        assert_eq!(result.successful_count, 1);
        assert_eq!(result.failed_count, 1);
        assert!(result.processed_chunks[1]
            .error_message
            .as_deref()
            .unwrap()
            .contains("connection refused"));
    }
}
