//! AgentCore Core Library
//!
//! This crate provides the foundational utilities shared by the AgentCore
//! crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (`ChunkerConfig`, `ProcessorConfig`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, ChunkerConfig, ProcessorConfig};
pub use error::{AppError, AppResult};
pub use logging::LogFormat;
