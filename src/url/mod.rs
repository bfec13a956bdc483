//! URL handling module for Tidepool
//!
//! This module provides seed validation, host keys for the per-host
//! connection cap, href resolution, and the cheap candidate filter applied to
//! discovered links before they are admitted.

mod domain;
mod resolve;

// Re-export main functions
pub use domain::host_key;
pub use resolve::{parse_seed, resolve_href};

/// Links shorter than this are never admitted
pub const MIN_LINK_LEN: usize = 20;

/// Checks whether a discovered link may become a fetch task
///
/// This is a deliberately crude heuristic rather than URL validation: the
/// link must start with `http://` or `https://` (case-sensitive) and be at
/// least [`MIN_LINK_LEN`] characters long.
///
/// # Examples
///
/// ```
/// use tidepool::url::is_candidate_link;
///
/// assert!(is_candidate_link("https://example.com/page"));
/// assert!(!is_candidate_link("https://a.io/"));
/// assert!(!is_candidate_link("HTTPS://EXAMPLE.COM/PAGE"));
/// assert!(!is_candidate_link("/relative/path/to/a/page"));
/// ```
pub fn is_candidate_link(link: &str) -> bool {
    if link.len() < MIN_LINK_LEN {
        return false;
    }
    link.starts_with("http://") || link.starts_with("https://")
}
