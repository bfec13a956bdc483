//! Tidepool: a bounded, budgeted web crawler
//!
//! This crate fetches pages starting from a seed URL and follows the links it
//! finds up to a fixed depth. All fetches are multiplexed by a single run loop
//! over a bounded connection pool, with global limits on how many pages may be
//! in flight and how many may be scheduled in total.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Tidepool operations
///
/// Only conditions that make the whole run unusable end up here. A single
/// page that fails to load is recorded in the output, not raised as an error.
#[derive(Debug, Error)]
pub enum TidepoolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output sink error at {path}: {source}")]
    Sink {
        path: String,
        source: std::io::Error,
    },

    #[error("Out of memory while buffering response from {url}")]
    Allocation { url: String },

    #[error("Fetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, TidepoolError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CancelFlag, CrawlRun, FetchTask};
pub use output::{FetchStatus, OutputRecord, RunStats};
