//! Response classification
//!
//! Decides whether a completed response is worth parsing for links.

/// Content type token a response must carry to be parsed
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// Outcome of classifying one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Parse it for links
    Eligible,
    /// Status other than 200
    NotOk(u16),
    /// Missing, empty, or non-HTML content type
    NotHtml,
    /// Body at or below the size floor
    TooSmall(usize),
}

impl Verdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Classifies a completed response
///
/// A response is eligible iff the status is 200, the content type contains
/// `text/html` (case-sensitive), and the body is longer than
/// `min_body_bytes`. Pure: the same inputs always give the same verdict.
///
/// # Examples
///
/// ```
/// use tidepool::crawler::{classify, Verdict};
///
/// assert_eq!(classify(200, Some("text/html; charset=utf-8"), 5000, 100), Verdict::Eligible);
/// assert_eq!(classify(404, Some("text/html"), 5000, 100), Verdict::NotOk(404));
/// assert_eq!(classify(200, None, 5000, 100), Verdict::NotHtml);
/// ```
pub fn classify(
    status: u16,
    content_type: Option<&str>,
    body_len: usize,
    min_body_bytes: usize,
) -> Verdict {
    if status != 200 {
        return Verdict::NotOk(status);
    }

    match content_type {
        Some(ct) if ct.contains(HTML_CONTENT_TYPE) => {}
        _ => return Verdict::NotHtml,
    }

    if body_len <= min_body_bytes {
        return Verdict::TooSmall(body_len);
    }

    Verdict::Eligible
}
