//! Error types for AgentCore.
//!
//! This module defines a unified error enum that covers all error categories
//! in the workspace: configuration, strategy selection, tokenization,
//! chunking, batch processing, I/O and serialization.

use thiserror::Error;

/// Unified error type for AgentCore.
///
/// Configuration and control-path problems surface as `AppError`.
/// Failures of a single chunk transformation never do: those are recorded
/// on the processed chunk instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown chunking strategy identifier
    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    /// Tokenizer loading or decoding errors
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Segmentation errors (parser setup, malformed input)
    #[error("Chunking error: {0}")]
    Chunking(String),

    /// Batch lifecycle errors raised by processing callbacks
    #[error("Processing error: {0}")]
    Processing(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Tokenizer(format!("{:#}", err))
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
