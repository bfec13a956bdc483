use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Tidepool
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    pub output: OutputConfig,
}

/// Crawl engine limits and policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum depth to follow links from the seed (seed is depth 0)
    pub max_depth: u32,

    /// Size of the connection pool across all hosts
    pub max_connections: usize,

    /// Connections allowed to any single host at once
    pub max_host_connections: usize,

    /// Cap on fetches scheduled over the whole run
    pub max_total: usize,

    /// Cap on fetches pending at any moment
    pub max_requests: usize,

    /// Links admitted from one page stop after this many plus one
    pub max_link_per_page: usize,

    /// Resolve hrefs against the page URL before filtering them
    pub follow_relative_links: bool,

    /// Longest the run loop blocks waiting for a completion (milliseconds)
    pub tick_millis: u64,

    /// Bodies of this many bytes or fewer are never parsed for links
    pub min_body_bytes: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_connections: 200,
            max_host_connections: 6,
            max_total: 100,
            max_requests: 500,
            max_link_per_page: 5,
            follow_relative_links: false,
            tick_millis: 1000,
            min_body_bytes: 100,
        }
    }
}

impl CrawlerConfig {
    /// The bounded wait used by each run loop iteration
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    pub user_agent: String,

    /// Total time allowed for one fetch, body included
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Redirect hops followed before the fetch is failed
    pub max_redirects: usize,

    /// Advertise gzip/brotli and decode transparently
    pub accept_compressed: bool,

    /// Keep an in-memory cookie jar for the run
    pub cookies: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Crawler Project".to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
            max_redirects: 10,
            accept_compressed: true,
            cookies: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the newline-delimited record file, truncated at run start
    pub sink_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sink_path: "datafile.txt".to_string(),
        }
    }
}
