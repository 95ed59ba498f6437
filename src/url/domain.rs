use crate::{UrlError, UrlResult};
use url::Url;

/// The address prefix that defines which pages belong to the archived site
///
/// Stored without a trailing slash so that `https://example.com` and
/// `https://example.com/` describe the same site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRoot {
    raw: String,
}

impl DomainRoot {
    /// Parses and validates a domain root
    ///
    /// # Examples
    ///
    /// ```
    /// use site_archiver::url::DomainRoot;
    ///
    /// let root = DomainRoot::parse("https://example.com/").unwrap();
    /// assert_eq!(root.as_str(), "https://example.com");
    /// ```
    pub fn parse(address: &str) -> UrlResult<Self> {
        let trimmed = address.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| UrlError::Parse(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        if url.host_str().is_none() {
            return Err(UrlError::MissingDomain);
        }

        Ok(Self {
            raw: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if `address` lies under this root
    ///
    /// The root must match as a prefix and end on a boundary, so
    /// `https://example.com.evil.org` is not under `https://example.com`.
    pub fn contains(&self, address: &str) -> bool {
        match address.strip_prefix(self.raw.as_str()) {
            Some(rest) => {
                rest.is_empty()
                    || rest.starts_with('/')
                    || rest.starts_with('?')
                    || rest.starts_with('#')
            }
            None => false,
        }
    }

    /// Strips the root from `address`, leaving it untouched when it is not under the root
    pub fn relative_path<'a>(&self, address: &'a str) -> &'a str {
        address.strip_prefix(self.raw.as_str()).unwrap_or(address)
    }

    /// Resolves a stylesheet-style href against the root
    ///
    /// Absolute hrefs are returned as-is and root-relative hrefs
    /// (`/css/site.css`) are appended to the root. Anything else is joined
    /// onto the root as a directory.
    pub fn resolve(&self, href: &str) -> UrlResult<Url> {
        let href = href.trim();

        if let Ok(absolute) = Url::parse(href) {
            return Ok(absolute);
        }

        let joined = if href.starts_with('/') {
            Url::parse(&format!("{}{}", self.raw, href))
        } else {
            Url::parse(&format!("{}/", self.raw)).and_then(|base| base.join(href))
        };

        joined.map_err(|e| UrlError::Parse(format!("{} ({})", href, e)))
    }

    /// The last non-empty path segment of an href, ignoring query and fragment
    ///
    /// Used to name stylesheets, which are archived without their directory.
    pub fn file_name(&self, href: &str) -> Option<String> {
        let path = self.relative_path(href.trim());
        let path = path.split(['?', '#']).next().unwrap_or_default();

        path.split('/')
            .filter(|segment| !segment.is_empty())
            .last()
            .map(str::to_string)
    }
}
