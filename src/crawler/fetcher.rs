//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the run's transport settings
//! - The fetch unit: one GET, its redirect hops, and the buffer the body
//!   streams into
//! - Error classification for failed transfers

use crate::config::{CrawlerConfig, FetchConfig};
use crate::crawler::pool::ConnectionPool;
use crate::url::host_key;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::collections::TryReserveError;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A URL waiting to be fetched, and how far it is from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub url: String,
    pub depth: u32,
}

impl FetchTask {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }

    /// The depth-0 task a run starts from
    pub fn seed(url: &Url) -> Self {
        Self::new(url.as_str(), 0)
    }
}

/// Growable buffer a response body is streamed into
///
/// Only grows. Allocation failure is reported instead of aborting so the
/// run loop can stop the crawl cleanly.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    bytes: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk as it arrives from the transport
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), TryReserveError> {
        self.bytes.try_reserve(chunk.len())?;
        self.bytes.extend_from_slice(chunk);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A response that arrived in full
#[derive(Debug)]
pub struct FetchedResponse {
    /// Final URL after redirects
    pub effective_url: String,

    pub status: u16,

    /// Content-Type header value, if present and readable
    pub content_type: Option<String>,

    pub body: ResponseBuffer,
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// The server answered and the body was read completely
    Response(FetchedResponse),

    /// No usable response: connect, DNS, TLS, timeout, redirect or body error
    ///
    /// `url` is the last URL the transport tried, which is a redirect target
    /// when a hop after the first one failed.
    Failed { url: String, reason: String },

    /// The body could not be buffered
    OutOfMemory,
}

/// A finished fetch unit, handed back to the run loop
#[derive(Debug)]
pub struct Completion {
    pub task: FetchTask,
    pub outcome: FetchOutcome,
}

/// Builds an HTTP client with the run's transport settings
///
/// The client itself never follows redirects: [`fetch_unit`] follows them
/// hop by hop so every hop waits for a slot on its own host. Compressed
/// transfer and an in-memory cookie jar are enabled by default.
///
/// # Example
///
/// ```no_run
/// use tidepool::config::Config;
/// use tidepool::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.fetch, &config.crawler).unwrap();
/// ```
pub fn build_http_client(
    fetch: &FetchConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(fetch.user_agent.as_str())
        .timeout(Duration::from_secs(fetch.timeout_secs))
        .connect_timeout(Duration::from_secs(fetch.connect_timeout_secs))
        .redirect(Policy::none())
        .pool_max_idle_per_host(crawler.max_host_connections)
        .gzip(fetch.accept_compressed)
        .brotli(fetch.accept_compressed)
        .cookie_store(fetch.cookies)
        .build()
}

/// Runs one fetch unit to completion
///
/// Waits for a pool slot, sends the GET, follows up to `max_redirects`
/// redirects, and streams the final body into a fresh [`ResponseBuffer`].
/// Every failure is captured in the returned [`Completion`]; there are no
/// retries.
pub async fn fetch_unit(
    client: Client,
    pool: Arc<ConnectionPool>,
    max_redirects: usize,
    task: FetchTask,
) -> Completion {
    let outcome = fetch_outcome(&client, &pool, max_redirects, &task.url).await;
    Completion { task, outcome }
}

async fn fetch_outcome(
    client: &Client,
    pool: &ConnectionPool,
    max_redirects: usize,
    url: &str,
) -> FetchOutcome {
    let mut current = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return failed(url, format!("Invalid URL: {}", e)),
    };
    let mut redirects = 0;

    loop {
        let host = match host_key(&current) {
            Some(h) => h,
            None => return failed(current.as_str(), "URL has no host"),
        };

        // Held until this hop's response is finished with
        let _permit = match pool.acquire(&host).await {
            Ok(p) => p,
            Err(_) => return failed(current.as_str(), "Connection pool closed"),
        };

        let mut response = match client.get(current.clone()).send().await {
            Ok(r) => r,
            Err(e) => return failed(current.as_str(), describe_error(&e)),
        };

        if let Some(next) = redirect_target(&response) {
            if redirects == max_redirects {
                return failed(current.as_str(), "Too many redirects");
            }
            redirects += 1;
            tracing::trace!("Redirect {} -> {}", current, next);
            current = next;
            continue;
        }

        let status = response.status().as_u16();
        let effective_url = current.to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = ResponseBuffer::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if body.append(&chunk).is_err() {
                        return FetchOutcome::OutOfMemory;
                    }
                }
                Ok(None) => break,
                Err(e) => return failed(&effective_url, describe_error(&e)),
            }
        }

        return FetchOutcome::Response(FetchedResponse {
            effective_url,
            status,
            content_type,
            body,
        });
    }
}

/// Where a redirect response points, resolved against the URL that sent it
///
/// A 3xx without a usable `Location` is treated as a final response.
fn redirect_target(response: &Response) -> Option<Url> {
    let status = response.status();
    let is_redirect = matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    );
    if !is_redirect {
        return None;
    }

    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(location).ok()
}

fn failed(url: &str, reason: impl Into<String>) -> FetchOutcome {
    FetchOutcome::Failed {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Short description of a transport error for logs and records
fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    }
}
