//! Crawl run loop
//!
//! This module contains the loop that drives every fetch of a run:
//! - Admitting tasks as fetch units into the connection pool
//! - Waiting, with a bounded timeout, for units to complete
//! - Draining each batch of completions in the order they are reaped
//! - Recording, classifying and expanding each completed page
//! - Stopping when nothing is pending or cancellation is observed

use crate::config::{CrawlerConfig, FetchConfig};
use crate::crawler::budget::Budget;
use crate::crawler::classifier::classify;
use crate::crawler::expander::{expand, expansion_cap};
use crate::crawler::fetcher::{
    build_http_client, fetch_unit, Completion, FetchOutcome, FetchTask, FetchedResponse,
};
use crate::crawler::parser::LinkExtractor;
use crate::crawler::pool::ConnectionPool;
use crate::crawler::run::CancelFlag;
use crate::output::{FetchStatus, OutputRecord, RecordSink, RunStats};
use crate::TidepoolError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Progress is logged every this many completions
const PROGRESS_INTERVAL: usize = 10;

/// Single-threaded run loop over many concurrent fetch units
///
/// Units run as tasks that only perform network I/O. Everything that reads
/// or changes crawl state (budget, sink, statistics) happens here, one
/// completion at a time.
pub struct Reactor<'a> {
    config: CrawlerConfig,
    client: Client,
    max_redirects: usize,
    pool: Arc<ConnectionPool>,
    units: JoinSet<Completion>,
    budget: Budget,
    stats: RunStats,
    sink: &'a mut dyn RecordSink,
    cancel: CancelFlag,
    rng: StdRng,
}

impl<'a> Reactor<'a> {
    /// Creates a run loop with an empty pool
    ///
    /// # Arguments
    ///
    /// * `config` - Limits and policy for this run
    /// * `fetch` - Transport settings shared by all fetch units
    /// * `sink` - Receives one record per completed fetch
    /// * `cancel` - Checked between iterations
    pub fn new(
        config: CrawlerConfig,
        fetch: &FetchConfig,
        sink: &'a mut dyn RecordSink,
        cancel: CancelFlag,
    ) -> Result<Self, TidepoolError> {
        let client = build_http_client(fetch, &config)?;
        let pool = Arc::new(ConnectionPool::new(
            config.max_connections,
            config.max_host_connections,
        ));
        Ok(Self {
            config,
            client,
            max_redirects: fetch.max_redirects,
            pool,
            units: JoinSet::new(),
            budget: Budget::new(),
            stats: RunStats::new(""),
            sink,
            cancel,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Uses a fixed random source for link sampling
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Runs the crawl from `seed` until nothing is pending or cancellation
    ///
    /// Fetch units still in flight when cancellation is observed are
    /// abandoned: they are dropped with the loop, produce no record, and are
    /// counted in [`RunStats::abandoned`].
    ///
    /// # Returns
    ///
    /// * `Ok(RunStats)` - The run ended normally or was cancelled
    /// * `Err(TidepoolError)` - Sink failure, allocation failure, or a fetch task died
    pub async fn run(mut self, seed: FetchTask) -> Result<RunStats, TidepoolError> {
        self.stats = RunStats::new(seed.url.clone());
        tracing::info!(
            "Starting crawl from {} (max depth {})",
            seed.url,
            self.config.max_depth
        );

        self.admit(seed);
        let tick = self.config.tick();

        while self.budget.pending() > 0 {
            if self.cancel.is_cancelled() {
                tracing::info!(
                    "Cancellation requested, abandoning {} pending fetches",
                    self.budget.pending()
                );
                self.stats.cancelled = true;
                break;
            }

            let joined = tokio::select! {
                waited = tokio::time::timeout(tick, self.units.join_next()) => waited,
                _ = self.cancel.cancelled() => continue,
            };

            let first = match joined {
                Err(_) => {
                    tracing::trace!("No completions this tick, {} pending", self.budget.pending());
                    continue;
                }
                Ok(None) => break,
                Ok(Some(result)) => result?,
            };

            self.process(first)?;
            while let Some(result) = self.units.try_join_next() {
                self.process(result?)?;
            }
        }

        self.stats.scheduled_total = self.budget.scheduled_total();
        self.stats.completed = self.budget.completed();
        self.stats.abandoned = self.budget.pending();
        self.stats.finish();

        tracing::info!(
            "Crawl finished: {} completed, {} failed, {} abandoned, {} scheduled",
            self.stats.completed,
            self.stats.failed,
            self.stats.abandoned,
            self.stats.scheduled_total
        );

        Ok(self.stats)
    }

    /// Turns a task into a fetch unit in the pool
    fn admit(&mut self, task: FetchTask) {
        self.budget.admit(1);
        self.units.spawn(fetch_unit(
            self.client.clone(),
            Arc::clone(&self.pool),
            self.max_redirects,
            task,
        ));
    }

    /// Handles one completed fetch unit
    fn process(&mut self, completion: Completion) -> Result<(), TidepoolError> {
        let ordinal = self.budget.complete();
        let Completion { task, outcome } = completion;

        match outcome {
            FetchOutcome::OutOfMemory => {
                return Err(TidepoolError::Allocation { url: task.url });
            }

            FetchOutcome::Failed { url, reason } => {
                tracing::warn!("Fetch failed for {}: {}", url, reason);
                self.stats.failed += 1;
                self.sink.write_record(&OutputRecord::new(
                    ordinal,
                    url,
                    FetchStatus::Failed(reason),
                ))?;
            }

            FetchOutcome::Response(response) => {
                tracing::debug!(
                    "[{}] {} -> {} ({} bytes, depth {})",
                    ordinal,
                    response.effective_url,
                    response.status,
                    response.body.len(),
                    task.depth
                );
                self.sink.write_record(&OutputRecord::new(
                    ordinal,
                    response.effective_url.clone(),
                    FetchStatus::Http(response.status),
                ))?;

                for next in self.expand_page(&task, &response) {
                    self.admit(next);
                }
            }
        }

        if self.budget.completed() % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {} completed, {} pending, {} scheduled",
                self.budget.completed(),
                self.budget.pending(),
                self.budget.scheduled_total()
            );
        }

        Ok(())
    }

    /// Classifies a response and, if eligible, samples its links
    fn expand_page(&mut self, task: &FetchTask, response: &FetchedResponse) -> Vec<FetchTask> {
        let verdict = classify(
            response.status,
            response.content_type.as_deref(),
            response.body.len(),
            self.config.min_body_bytes,
        );
        if !verdict.is_eligible() {
            tracing::debug!("Not expanding {}: {:?}", response.effective_url, verdict);
            return Vec::new();
        }

        // Depth and budget are settled before paying for a parse
        if expansion_cap(task.depth, &self.budget, &self.config).is_none() {
            return Vec::new();
        }

        let links: Vec<String> = LinkExtractor::parse(
            response.body.as_bytes(),
            &response.effective_url,
            self.config.follow_relative_links,
        )
        .hrefs()
        .collect();
        self.stats.pages_expanded += 1;

        let admitted = expand(task.depth, &links, &self.budget, &self.config, &mut self.rng);
        tracing::debug!(
            "{}: {} links found, {} admitted",
            response.effective_url,
            links.len(),
            admitted.len()
        );
        self.stats.links_admitted += admitted.len();

        admitted
    }
}
