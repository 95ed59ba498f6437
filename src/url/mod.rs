//! URL handling module for Site-Archiver
//!
//! This module provides domain-root scoping, visit-key normalization and the
//! link filter that decides which hrefs the crawler follows.

mod domain;
mod normalize;

use crate::config::RelativeLinkPolicy;
use url::Url;

// Re-export main functions
pub use domain::DomainRoot;
pub use normalize::{strip_fragment, visit_key};

/// Suffix of feed files, which are never followed
const FEED_SUFFIX: &str = ".xml";

/// Schemes that never point at an archivable page
const UNSUPPORTED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Outcome of running an href through the [`LinkFilter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
    /// In scope; carries the address to fetch
    Follow(String),
    /// Address is outside the domain root
    OffDomain,
    /// Address is an XML feed
    Feed,
    /// Relative href under the reject policy
    Relative,
    /// Empty, fragment-only or non-page scheme
    Unsupported,
}

/// Decides which anchor hrefs belong to the crawl
///
/// # Filter Rules
///
/// 1. Empty hrefs, fragment-only hrefs and `javascript:`/`mailto:`/`tel:`/`data:` are dropped
/// 2. Relative hrefs are resolved against the page they appear on, or dropped
///    under [`RelativeLinkPolicy::Reject`]
/// 3. The fragment is removed
/// 4. Addresses outside the domain root are dropped
/// 5. Addresses ending in `.xml` are dropped
#[derive(Debug, Clone)]
pub struct LinkFilter {
    root: DomainRoot,
    relative: RelativeLinkPolicy,
}

impl LinkFilter {
    pub fn new(root: DomainRoot, relative: RelativeLinkPolicy) -> Self {
        Self { root, relative }
    }

    pub fn root(&self) -> &DomainRoot {
        &self.root
    }

    /// Classifies `href`, found on the page at `page_address`
    ///
    /// # Examples
    ///
    /// ```
    /// use site_archiver::config::RelativeLinkPolicy;
    /// use site_archiver::url::{DomainRoot, LinkDecision, LinkFilter};
    ///
    /// let root = DomainRoot::parse("https://example.com").unwrap();
    /// let filter = LinkFilter::new(root, RelativeLinkPolicy::Resolve);
    ///
    /// assert_eq!(
    ///     filter.evaluate("/about", "https://example.com/posts/"),
    ///     LinkDecision::Follow("https://example.com/about".to_string())
    /// );
    /// assert_eq!(
    ///     filter.evaluate("https://example.com/feed.xml", "https://example.com"),
    ///     LinkDecision::Feed
    /// );
    /// ```
    pub fn evaluate(&self, href: &str, page_address: &str) -> LinkDecision {
        let href = href.trim();

        if href.is_empty() || href.starts_with('#') {
            return LinkDecision::Unsupported;
        }

        let lowered = href.to_ascii_lowercase();
        if UNSUPPORTED_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            return LinkDecision::Unsupported;
        }

        let address = if Url::parse(href).is_ok() {
            strip_fragment(href).to_string()
        } else {
            match self.relative {
                RelativeLinkPolicy::Reject => return LinkDecision::Relative,
                RelativeLinkPolicy::Resolve => match resolve_relative(href, page_address) {
                    Some(resolved) => resolved,
                    None => return LinkDecision::Unsupported,
                },
            }
        };

        if !self.root.contains(&address) {
            return LinkDecision::OffDomain;
        }

        if address.ends_with(FEED_SUFFIX) {
            return LinkDecision::Feed;
        }

        LinkDecision::Follow(address)
    }
}

/// Joins a relative href onto the address of the page it was found on
fn resolve_relative(href: &str, page_address: &str) -> Option<String> {
    let mut resolved = Url::parse(page_address).ok()?.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
