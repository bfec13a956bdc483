//! Run statistics
//!
//! Counters collected by the run loop and reported when a crawl ends.

use chrono::{DateTime, Utc};

/// Summary of one crawl run
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Seed URL the run started from
    pub seed: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Fetches admitted over the whole run, seed included
    pub scheduled_total: usize,

    /// Fetches whose completion was processed
    pub completed: usize,

    /// Completed fetches that ended without a response
    pub failed: usize,

    /// Fetches still pending when the loop stopped
    pub abandoned: usize,

    /// Pages that passed the classifier and were parsed for links
    pub pages_expanded: usize,

    /// New fetch tasks admitted from parsed pages
    pub links_admitted: usize,

    /// Whether the run stopped because cancellation was requested
    pub cancelled: bool,
}

impl RunStats {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            started_at: Utc::now(),
            finished_at: None,
            scheduled_total: 0,
            completed: 0,
            failed: 0,
            abandoned: 0,
            pages_expanded: 0,
            links_admitted: 0,
            cancelled: false,
        }
    }

    /// Marks the run finished now
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Completed fetches that got an HTTP response
    pub fn responded(&self) -> usize {
        self.completed - self.failed
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Run:");
    println!("  Seed: {}", stats.seed);
    println!("  Started: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(secs) = stats.duration_seconds() {
        println!("  Duration: {:.1}s", secs);
    }
    if stats.cancelled {
        println!("  Stopped early: interrupted");
    }
    println!();

    println!("Fetches:");
    println!("  Scheduled: {}", stats.scheduled_total);
    println!("  Completed: {}", stats.completed);
    println!("  Responded: {}", stats.responded());
    println!("  Connection failures: {}", stats.failed);
    println!("  Abandoned: {}", stats.abandoned);
    println!();

    println!("Expansion:");
    println!("  Pages parsed for links: {}", stats.pages_expanded);
    println!("  Links admitted: {}", stats.links_admitted);
}
