//! Crawl engine
//!
//! This module contains the core crawling logic, including:
//! - Fetch units and the bounded connection pool they draw from
//! - Response classification and HTML link extraction
//! - Frontier expansion under depth and budget limits
//! - The run loop and the run controller around it
//!
//! One run loop drives every fetch of a crawl. Fetches overlap on the
//! network, but their completions are handled one at a time, so the budget
//! counters need no locking. Completion order depends on the network and the
//! link sampling is random, so two runs over the same site can record pages
//! in a different order and can even discover different pages.

mod budget;
mod classifier;
mod expander;
mod fetcher;
mod parser;
mod pool;
mod reactor;
mod run;

pub use budget::Budget;
pub use classifier::{classify, Verdict, HTML_CONTENT_TYPE};
pub use expander::{expand, expansion_cap};
pub use fetcher::{
    build_http_client, fetch_unit, Completion, FetchOutcome, FetchTask, FetchedResponse,
    ResponseBuffer,
};
pub use parser::LinkExtractor;
pub use pool::{ConnectionPool, PoolPermit};
pub use reactor::Reactor;
pub use run::{CancelFlag, CrawlRun};
