//! Storage key derivation
//!
//! Maps a source address onto a date-partitioned, hierarchy-preserving blob
//! name. Derivation is a pure function of its inputs.

use crate::url::DomainRoot;
use chrono::NaiveDate;
use std::fmt;

/// Address token the landing page is stored under
pub const ROOT_DOCUMENT_TOKEN: &str = "main";

/// Extension assumed when an address carries none
pub const DEFAULT_EXTENSION: &str = "html";

/// Extension pinned for stylesheets
pub const STYLESHEET_EXTENSION: &str = "css";

/// Base name used when an address has no final segment
const INDEX_BASE_NAME: &str = "index";

/// Longest local name handed to the filesystem, well under the usual 255-byte limit
const MAX_LOCAL_NAME_LEN: usize = 64;

/// Where an archived object lives in the container
///
/// Rendered as `{date}/{directory}/{base_name}.{extension}`, with an empty
/// directory collapsing and an empty extension omitting the dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub directory: Vec<String>,
    pub base_name: String,
    pub extension: String,
    pub date_partition: String,
}

impl StorageKey {
    /// Derives the key for `source`
    ///
    /// # Derivation Steps
    ///
    /// 1. Strip the domain root from the address
    /// 2. Drop a trailing `/`
    /// 3. Split on the last `/`: the head is the directory, the tail the base name
    /// 4. Use `explicit_extension` if given (an identical suffix on the base
    ///    name is not doubled); otherwise take the text after the last `.` of
    ///    the base name, defaulting to `html`
    /// 5. Prefix the date partition rendered with `date_format`
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use site_archiver::storage::StorageKey;
    /// use site_archiver::url::DomainRoot;
    ///
    /// let root = DomainRoot::parse("https://example.com").unwrap();
    /// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    /// let key = StorageKey::derive("https://example.com/posts/my-post/", &root, None, date, "%d%m%Y");
    ///
    /// assert_eq!(key.to_string(), "09032024/posts/my-post.html");
    /// ```
    pub fn derive(
        source: &str,
        root: &DomainRoot,
        explicit_extension: Option<&str>,
        date: NaiveDate,
        date_format: &str,
    ) -> Self {
        let relative = root.relative_path(source);
        let relative = relative.strip_suffix('/').unwrap_or(relative);

        let (directory, candidate) = match relative.rfind('/') {
            Some(index) => (&relative[..index], &relative[index + 1..]),
            None => ("", relative),
        };

        let directory: Vec<String> = directory
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        let (base_name, extension) = match explicit_extension {
            Some(extension) => {
                let suffix = format!(".{}", extension);
                let base = candidate.strip_suffix(suffix.as_str()).unwrap_or(candidate);
                (base, extension)
            }
            None => split_extension(candidate),
        };

        let base_name = if base_name.is_empty() {
            INDEX_BASE_NAME
        } else {
            base_name
        };

        Self {
            directory,
            base_name: base_name.to_string(),
            extension: extension.to_string(),
            date_partition: date.format(date_format).to_string(),
        }
    }

    /// `{base_name}.{extension}`, or just the base name without an extension
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.base_name.clone()
        } else {
            format!("{}.{}", self.base_name, self.extension)
        }
    }

    /// The key without its date partition
    pub fn relative_name(&self) -> String {
        if self.directory.is_empty() {
            self.file_name()
        } else {
            format!("{}/{}", self.directory.join("/"), self.file_name())
        }
    }

    /// A flat, filesystem-safe rendering used to name scratch files
    ///
    /// Only the trailing [`MAX_LOCAL_NAME_LEN`] characters are kept, so the
    /// extension survives and long addresses still fit in one path component.
    pub fn local_name(&self) -> String {
        let flat: Vec<char> = self
            .relative_name()
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '_' | '-' => c,
                _ => '-',
            })
            .collect();

        let start = flat.len().saturating_sub(MAX_LOCAL_NAME_LEN);
        flat[start..].iter().collect()
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.date_partition, self.relative_name())
    }
}

/// Splits `name` on its last `.`; a leading dot does not start an extension
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(index) if index > 0 => (&name[..index], &name[index + 1..]),
        _ => (name, DEFAULT_EXTENSION),
    }
}
