//! HTML parser for selecting link-bearing nodes
//!
//! Documents keep the bytes exactly as received; markup is decoded lossily
//! only to select hrefs. This module handles parsing fetched markup to extract:
//! - Anchor hrefs (`<a href="...">`) for traversal
//! - Stylesheet hrefs (`<link rel="stylesheet" href="...">`) for archiving

use scraper::{Html, Selector};
use std::borrow::Cow;

/// Selector for anchors carrying an href
const ANCHOR_SELECTOR: &str = "a[href]";

/// Selector for stylesheet links carrying an href
const STYLESHEET_SELECTOR: &str = "link[rel~='stylesheet'][href]";

/// A fetched document and the address it came from
#[derive(Debug, Clone)]
pub struct Document {
    address: String,
    body: Vec<u8>,
}

impl Document {
    pub fn new(address: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            body: body.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// The response body exactly as received
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Raw href values of every anchor, in document order
    pub fn anchor_hrefs(&self) -> Vec<String> {
        select_hrefs(&self.markup(), ANCHOR_SELECTOR)
    }

    /// Raw href values of every stylesheet link, in document order
    pub fn stylesheet_hrefs(&self) -> Vec<String> {
        select_hrefs(&self.markup(), STYLESHEET_SELECTOR)
    }

    /// Text view of the body for href selection; invalid UTF-8 is replaced
    fn markup(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Parses `html` and returns the `href` attribute of each node matching `selector`
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `selector` - A CSS selector; nodes without an `href` are skipped
///
/// # Example
///
/// ```
/// use site_archiver::crawler::select_hrefs;
///
/// let html = r#"<html><body><a href="/page">Link</a><a>No href</a></body></html>"#;
/// assert_eq!(select_hrefs(html, "a[href]"), vec!["/page".to_string()]);
/// ```
pub fn select_hrefs(html: &str, selector: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse(selector) else {
        tracing::warn!("Invalid selector: {}", selector);
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
