//! Frontier expansion
//!
//! Turns the links found on one page into new fetch tasks one level deeper.
//!
//! Links are not taken in document order. Each draw picks an index uniformly
//! over all links on the page, independently of earlier draws, and there are
//! as many draws as links. The same link can therefore be drawn (and
//! admitted) more than once while others are never drawn. Admission from a
//! page stops after `max_link_per_page + 1` tasks.

use crate::config::CrawlerConfig;
use crate::crawler::budget::Budget;
use crate::crawler::fetcher::FetchTask;
use crate::url::is_candidate_link;
use rand::Rng;

/// Upper bound on tasks a page at `depth` may admit right now
///
/// Returns `None` when the page may admit nothing: it is already at
/// `max_depth`, or the budget gate is closed. Evaluated once per page.
pub fn expansion_cap(depth: u32, budget: &Budget, config: &CrawlerConfig) -> Option<usize> {
    if depth >= config.max_depth {
        return None;
    }
    if !budget.can_expand(config) {
        return None;
    }

    let cap = (config.max_link_per_page + 1).min(budget.allowance(config));
    (cap > 0).then_some(cap)
}

/// Samples `links` from a page at `depth` into new tasks at `depth + 1`
///
/// Only links passing [`is_candidate_link`] are admitted. The budget is read
/// once, before sampling starts; the caller records the admissions.
pub fn expand<R: Rng>(
    depth: u32,
    links: &[String],
    budget: &Budget,
    config: &CrawlerConfig,
    rng: &mut R,
) -> Vec<FetchTask> {
    let Some(cap) = expansion_cap(depth, budget, config) else {
        return Vec::new();
    };

    let mut admitted = Vec::new();
    for _ in 0..links.len() {
        let link = &links[rng.random_range(0..links.len())];
        if !is_candidate_link(link) {
            continue;
        }

        tracing::debug!("Admitting {} at depth {}", link, depth + 1);
        admitted.push(FetchTask::new(link.clone(), depth + 1));
        if admitted.len() >= cap {
            break;
        }
    }

    admitted
}
