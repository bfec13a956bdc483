//! Global crawl budget
//!
//! Counts fetches as they move from admitted to completed and decides
//! whether a page may add more. Owned and mutated only by the run loop.

use crate::config::CrawlerConfig;

/// Pending, completed and scheduled fetch counters for one run
///
/// Invariant: `scheduled_total == completed + pending` while the run loop is
/// active; after it stops, `pending` is the number of abandoned fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    pending: usize,
    completed: usize,
    scheduled_total: usize,
}

impl Budget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn scheduled_total(&self) -> usize {
        self.scheduled_total
    }

    /// Records `count` newly admitted fetches
    pub fn admit(&mut self, count: usize) {
        self.pending += count;
        self.scheduled_total += count;
    }

    /// Moves one fetch from pending to completed
    ///
    /// Returns the ordinal for its output record: the number of fetches
    /// completed before it.
    pub fn complete(&mut self) -> usize {
        debug_assert!(self.pending > 0, "completion without a pending fetch");
        let ordinal = self.completed;
        self.pending = self.pending.saturating_sub(1);
        self.completed += 1;
        ordinal
    }

    /// Whether a page may admit anything at all
    ///
    /// Checked once per page before any link is sampled.
    pub fn can_expand(&self, config: &CrawlerConfig) -> bool {
        self.pending < config.max_requests && self.completed + self.pending < config.max_total
    }

    /// How many fetches may still be admitted without breaking either cap
    pub fn allowance(&self, config: &CrawlerConfig) -> usize {
        if !self.can_expand(config) {
            return 0;
        }
        let in_flight_room = config.max_requests - self.pending;
        let total_room = config.max_total.saturating_sub(self.scheduled_total);
        in_flight_room.min(total_room)
    }
}
