//! Configuration module for Tidepool
//!
//! Every setting has a default, so a crawl can run without any file. A TOML
//! file may override any subset of keys; the CLI then overrides the depth,
//! the sink path and the relative-link mode.
//!
//! # Example
//!
//! ```no_run
//! use tidepool::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tidepool.toml")).unwrap();
//! println!("Pool size: {}", config.crawler.max_connections);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FetchConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
