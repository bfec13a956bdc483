//! Run controller
//!
//! Serializes crawls, wires up interrupt handling, and owns the output sink
//! for the lifetime of a run.

use crate::config::Config;
use crate::crawler::fetcher::FetchTask;
use crate::crawler::reactor::Reactor;
use crate::output::{display_sink, FileSink, RecordSink, RunStats};
use crate::url::parse_seed;
use crate::TidepoolError;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

/// Cooperative cancellation signal shared between a run and its interrupt handler
///
/// Once set it stays set. The run loop checks it between iterations and
/// wakes early from its wait when it is set; fetches already in flight are
/// never interrupted by it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Process-wide lock allowing one crawl at a time
fn run_lock() -> &'static Mutex<()> {
    static RUN_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    RUN_LOCK.get_or_init(|| Mutex::new(()))
}

/// Sets `cancel` when the process receives an interrupt (Ctrl-C / SIGINT)
fn install_interrupt_handler(cancel: CancelFlag) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupt received, finishing current batch");
                cancel.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for interrupt signal: {}", e),
        }
    })
}

/// One crawl: configuration, cancellation flag, and output sink
///
/// Starting a run while another is executing anywhere in the process waits
/// for the first to finish.
pub struct CrawlRun {
    config: Config,
    cancel: CancelFlag,
}

impl CrawlRun {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Handle for cancelling this run from elsewhere
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Crawls from `seed`, writing records to the configured sink file
    ///
    /// The file is truncated when the run starts and flushed when it ends,
    /// whether the crawl finished, was cancelled, or failed.
    pub async fn execute(&self, seed: &str) -> Result<RunStats, TidepoolError> {
        let _guard = run_lock().lock().await;

        let path = Path::new(&self.config.output.sink_path);
        let mut sink = FileSink::create(path)?;
        tracing::debug!("Opened output sink {}", sink.path().display());

        self.drive(seed, &mut sink).await
    }

    /// Crawls from `seed`, writing records to `sink`
    pub async fn execute_with_sink(
        &self,
        seed: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<RunStats, TidepoolError> {
        let _guard = run_lock().lock().await;
        self.drive(seed, sink).await
    }

    /// Copies the sink file of the last run to `out`
    pub fn display(&self, out: &mut dyn Write) -> Result<usize, TidepoolError> {
        display_sink(Path::new(&self.config.output.sink_path), out)
    }

    async fn drive(
        &self,
        seed: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<RunStats, TidepoolError> {
        let result = self.run_reactor(seed, &mut *sink).await;
        let closed = sink.close();

        let stats = result?;
        closed?;
        Ok(stats)
    }

    async fn run_reactor(
        &self,
        seed: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<RunStats, TidepoolError> {
        let seed_url = parse_seed(seed)?;
        let reactor = Reactor::new(
            self.config.crawler.clone(),
            &self.config.fetch,
            sink,
            self.cancel.clone(),
        )?;

        let interrupt = install_interrupt_handler(self.cancel.clone());
        let result = reactor.run(FetchTask::seed(&seed_url)).await;
        interrupt.abort();

        result
    }
}
