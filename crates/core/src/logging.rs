//! Logging infrastructure for AgentCore.
//!
//! Logs always go to stderr, so chunk output that an embedding application
//! writes to stdout stays clean. Two output formats are available: human
//! readable text and one JSON object per line for log shippers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Config(format!(
                "Unknown log format '{}'. Supported: text, json",
                other
            ))),
        }
    }
}

/// Initialize text logging on stderr.
///
/// `log_level` takes an `EnvFilter` directive such as `"debug"` or
/// `"agentcore_chunking=trace"`; without one, `RUST_LOG` or `info` is used.
///
/// # Example
/// ```no_run
/// use agentcore_core::logging::init_logging;
///
/// init_logging(None, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    init_logging_with_format(log_level, no_color, LogFormat::Text)
}

/// Initialize logging from the level, color and format settings of `config`.
pub fn init_from_config(config: &AppConfig) -> AppResult<()> {
    init_logging_with_format(config.log_level.as_deref(), config.no_color, config.log_format)
}

/// Initialize logging on stderr in the given format.
///
/// Fails with a `Config` error for an invalid filter, or when a global
/// subscriber is already installed.
pub fn init_logging_with_format(
    log_level: Option<&str>,
    no_color: bool,
    format: LogFormat,
) -> AppResult<()> {
    let filter = build_filter(log_level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(!no_color && supports_color()),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .try_init(),
    };

    installed.map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

fn build_filter(log_level: Option<&str>) -> AppResult<EnvFilter> {
    let directive = match log_level {
        Some(level) => level.to_string(),
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
    };

    EnvFilter::try_new(&directive)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", directive, e)))
}

fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}
