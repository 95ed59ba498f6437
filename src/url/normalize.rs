/// Removes the fragment (everything from `#`) from an address
///
/// # Examples
///
/// ```
/// use site_archiver::url::strip_fragment;
///
/// assert_eq!(strip_fragment("https://example.com/a#top"), "https://example.com/a");
/// ```
pub fn strip_fragment(address: &str) -> &str {
    match address.find('#') {
        Some(index) => &address[..index],
        None => address,
    }
}

/// Computes the key an address is recorded under in the visited set
///
/// Fragments are dropped and trailing slashes trimmed, so `/a`, `/a/` and
/// `/a#intro` count as one page. Nothing else is rewritten.
///
/// # Examples
///
/// ```
/// use site_archiver::url::visit_key;
///
/// assert_eq!(visit_key("https://example.com/posts/"), "https://example.com/posts");
/// assert_eq!(visit_key("https://example.com/"), "https://example.com");
/// ```
pub fn visit_key(address: &str) -> String {
    strip_fragment(address.trim()).trim_end_matches('/').to_string()
}
