//! Reference tokenizer used for token counts and token-based chunking.

use agentcore_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tiktoken_rs::CoreBPE;

/// Encoding used when the configured model has no known tokenizer.
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Token encoder/decoder shared read-only between chunking calls.
pub trait Tokenizer: Send + Sync + std::fmt::Debug {
    /// Name of the encoding or model.
    fn name(&self) -> &str;

    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids back into text.
    ///
    /// Fails when the ids end in the middle of a multi-byte character.
    fn decode(&self, tokens: &[u32]) -> AppResult<String>;

    /// Count the tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// BPE tokenizer backed by tiktoken.
pub struct TiktokenTokenizer {
    name: String,
    bpe: CoreBPE,
}

impl TiktokenTokenizer {
    /// Load the tokenizer for `model`, falling back to `cl100k_base`.
    pub fn for_model(model: &str) -> AppResult<Self> {
        match tiktoken_rs::get_bpe_from_model(model) {
            Ok(bpe) => Ok(Self {
                name: model.to_string(),
                bpe,
            }),
            Err(e) => {
                tracing::warn!(
                    "No tokenizer for model '{}' ({}), falling back to {}",
                    model,
                    e,
                    DEFAULT_ENCODING
                );
                Self::default_encoding()
            }
        }
    }

    /// Load the general-purpose `cl100k_base` encoding.
    pub fn default_encoding() -> AppResult<Self> {
        let bpe = tiktoken_rs::cl100k_base()?;
        Ok(Self {
            name: DEFAULT_ENCODING.to_string(),
            bpe,
        })
    }
}

impl std::fmt::Debug for TiktokenTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenTokenizer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe
            .encode_with_special_tokens(text)
            .into_iter()
            .map(|t| t as u32)
            .collect()
    }

    fn decode(&self, tokens: &[u32]) -> AppResult<String> {
        self.bpe
            .decode(tokens.iter().map(|&t| t as _).collect())
            .map_err(|e| AppError::Tokenizer(format!("Failed to decode tokens: {}", e)))
    }
}

type TokenizerCache = Mutex<HashMap<String, Arc<TiktokenTokenizer>>>;

/// Load (or reuse) the tokenizer for `model`.
///
/// BPE tables are large, so loaded tokenizers are cached per model name for
/// the lifetime of the process.
pub fn load_tokenizer(model: &str) -> AppResult<Arc<dyn Tokenizer>> {
    static CACHE: OnceLock<TokenizerCache> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    if let Some(found) = cache
        .lock()
        .map_err(|_| AppError::Tokenizer("Tokenizer cache poisoned".to_string()))?
        .get(model)
    {
        return Ok(found.clone());
    }

    let tokenizer = Arc::new(TiktokenTokenizer::for_model(model)?);
    tracing::debug!("Loaded tokenizer '{}' for model '{}'", tokenizer.name(), model);

    cache
        .lock()
        .map_err(|_| AppError::Tokenizer("Tokenizer cache poisoned".to_string()))?
        .insert(model.to_string(), tokenizer.clone());

    Ok(tokenizer)
}
