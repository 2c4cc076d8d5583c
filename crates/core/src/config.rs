//! Configuration management for AgentCore.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config files (.agentcore/config.yaml)
//! - Environment variables
//!
//! Chunking and processing settings are validated once, at load time, so that
//! configuration mistakes surface before any text is touched.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Chunker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Target chunk size (bytes for character strategies, tokens for token-based)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Trailing content repeated at the head of the next chunk
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Model whose tokenizer is used for token counts
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Sliding-window stride; defaults to `chunk_size - overlap`
    #[serde(default)]
    pub stride: Option<usize>,

    /// Minimum cosine similarity for a sentence to join a semantic group
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Dimensions of the built-in sentence embedder
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Strategy identifier used when callers do not pick one
    #[serde(default = "default_strategy")]
    pub default_strategy: String,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_overlap() -> usize {
    100
}

fn default_model_name() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_similarity_threshold() -> f32 {
    0.5
}

fn default_embedding_dimensions() -> usize {
    384
}

fn default_strategy() -> String {
    "adaptive".to_string()
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            model_name: default_model_name(),
            stride: None,
            similarity_threshold: default_similarity_threshold(),
            embedding_dimensions: default_embedding_dimensions(),
            default_strategy: default_strategy(),
        }
    }
}

impl ChunkerConfig {
    /// Create a config with the given size and overlap, defaults elsewhere.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            ..Default::default()
        }
    }

    /// Effective sliding-window stride.
    pub fn effective_stride(&self) -> usize {
        self.stride
            .unwrap_or_else(|| self.chunk_size.saturating_sub(self.overlap))
            .max(1)
    }

    /// Validate sizes and thresholds.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }

        if self.stride == Some(0) {
            return Err(AppError::Config(
                "stride must be greater than zero".to_string(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AppError::Config(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.embedding_dimensions == 0 {
            return Err(AppError::Config(
                "embedding_dimensions must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Chunk processor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Upper bound on concurrent transformations
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Chunks per batch in streaming mode
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Retry rounds for failed chunks
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Pause before each retry round, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_max_workers() -> usize {
    4
}

fn default_batch_size() -> usize {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl ProcessorConfig {
    /// Validate worker and batch bounds.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_workers == 0 {
            return Err(AppError::Config(
                "max_workers must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(AppError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Retry delay as a `Duration`.
    pub fn retry_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.retry_delay_ms)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .agentcore/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,

    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,

    /// Chunker settings
    pub chunking: ChunkerConfig,

    /// Processor settings
    pub processing: ProcessorConfig,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    chunking: Option<ChunkerConfig>,
    processing: Option<ProcessorConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    format: Option<LogFormat>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            no_color: false,
            log_format: LogFormat::default(),
            chunking: ChunkerConfig::default(),
            processing: ProcessorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML file and the environment.
    ///
    /// Environment variables:
    /// - `AGENTCORE_WORKSPACE`: Override workspace path
    /// - `AGENTCORE_CONFIG`: Path to config file
    /// - `AGENTCORE_CHUNK_SIZE`, `AGENTCORE_CHUNK_OVERLAP`
    /// - `AGENTCORE_TOKENIZER_MODEL`
    /// - `AGENTCORE_MAX_WORKERS`, `AGENTCORE_BATCH_SIZE`
    /// - `AGENTCORE_LOG_FORMAT`: `text` or `json`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use agentcore_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("chunk size: {}", config.chunking.chunk_size);
    /// ```
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("AGENTCORE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("AGENTCORE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.agentcore_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config = config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents).map_err(|e| match e {
            AppError::Serialization(msg) => {
                AppError::Config(format!("Failed to parse config file {:?}: {}", path, msg))
            }
            other => other,
        })
    }

    /// Merge YAML configuration text into this config.
    pub fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }

        if let Some(processing) = config_file.processing {
            result.processing = processing;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = format;
            }
        }

        Ok(result)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Malformed numeric values are configuration errors rather than being
    /// silently ignored.
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(size) = lookup("AGENTCORE_CHUNK_SIZE") {
            self.chunking.chunk_size = parse_env("AGENTCORE_CHUNK_SIZE", &size)?;
        }

        if let Some(overlap) = lookup("AGENTCORE_CHUNK_OVERLAP") {
            self.chunking.overlap = parse_env("AGENTCORE_CHUNK_OVERLAP", &overlap)?;
        }

        if let Some(model) = lookup("AGENTCORE_TOKENIZER_MODEL") {
            self.chunking.model_name = model;
        }

        if let Some(workers) = lookup("AGENTCORE_MAX_WORKERS") {
            self.processing.max_workers = parse_env("AGENTCORE_MAX_WORKERS", &workers)?;
        }

        if let Some(batch) = lookup("AGENTCORE_BATCH_SIZE") {
            self.processing.batch_size = parse_env("AGENTCORE_BATCH_SIZE", &batch)?;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }

        if let Some(format) = lookup("AGENTCORE_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }

        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(self)
    }

    /// Validate every section.
    pub fn validate(&self) -> AppResult<()> {
        self.chunking.validate()?;
        self.processing.validate()
    }

    /// Get the path to the .agentcore directory.
    pub fn agentcore_dir(&self) -> PathBuf {
        self.workspace.join(".agentcore")
    }
}

fn parse_env(key: &str, value: &str) -> AppResult<usize> {
    value.trim().parse::<usize>().map_err(|e| {
        AppError::Config(format!("Invalid value for {}: {:?} ({})", key, value, e))
    })
}
