//! HTML link extraction
//!
//! Parses a page body into a DOM tree and yields the `href` of every `<a>`
//! element. Parsing never touches the network and never fails: malformed
//! markup is repaired the way a browser would, and anything that cannot be
//! parsed simply contributes no links.

use crate::url::resolve_href;
use scraper::{Html, Selector};
use url::Url;

/// A parsed page ready to hand out its anchor targets
///
/// The sequence from [`LinkExtractor::hrefs`] is lazy and can be walked
/// again; nothing is kept once the extractor is dropped.
pub struct LinkExtractor {
    document: Html,
    anchors: Option<Selector>,
    base: Option<Url>,
}

impl LinkExtractor {
    /// Parses `body` fetched from `page_url`
    ///
    /// When `resolve_relative` is set, each href is resolved against
    /// `page_url` before it is yielded; otherwise hrefs come out exactly as
    /// written. Invalid UTF-8 is replaced rather than rejected.
    pub fn parse(body: &[u8], page_url: &str, resolve_relative: bool) -> Self {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let base = if resolve_relative {
            Url::parse(page_url).ok()
        } else {
            None
        };

        Self {
            document,
            anchors: Selector::parse("a[href]").ok(),
            base,
        }
    }

    /// Anchor targets in document order
    ///
    /// `<a>` elements without an `href` attribute are skipped. Repairing
    /// malformed markup can clone an unclosed anchor into the element that
    /// follows it, so the same href may come out more than once; each repeat
    /// counts as its own draw when the page is expanded.
    ///
    /// # Example
    ///
    /// ```
    /// use tidepool::crawler::LinkExtractor;
    ///
    /// let html = br#"<html><body><a href="/next">Next</a><a>none</a></body></html>"#;
    /// let extractor = LinkExtractor::parse(html, "https://example.com/start", true);
    /// let links: Vec<String> = extractor.hrefs().collect();
    /// assert_eq!(links, vec!["https://example.com/next".to_string()]);
    /// ```
    pub fn hrefs(&self) -> impl Iterator<Item = String> + '_ {
        self.anchors
            .iter()
            .flat_map(move |selector| self.document.select(selector))
            .filter_map(|element| element.value().attr("href"))
            .map(move |href| match &self.base {
                Some(base) => resolve_href(href, base),
                None => href.to_string(),
            })
    }
}
