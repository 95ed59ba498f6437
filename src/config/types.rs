use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Main configuration structure for Site-Archiver
///
/// Built once at startup from an optional TOML file plus environment
/// variables, then passed by reference to the crawler and archive writer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Storage account secret, only ever read from the environment
    #[serde(skip)]
    pub secret: Option<Secret>,
}

/// Site scoping configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    /// Address prefix defining which links are in scope
    #[serde(rename = "domain-root", default)]
    pub domain_root: String,

    /// What to do with hrefs that are not absolute addresses
    #[serde(rename = "relative-links", default)]
    pub relative_links: RelativeLinkPolicy,
}

/// Handling of relative (non-absolute) hrefs found in anchors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelativeLinkPolicy {
    /// Join against the address of the page the href appeared on
    #[default]
    Resolve,
    /// Drop the href
    Reject,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Blob container that receives archived objects
    #[serde(rename = "container-name", default)]
    pub container_name: String,

    /// Account used when the secret is a bare account key
    #[serde(rename = "account-name", default = "default_account_name")]
    pub account_name: String,

    /// Blob service endpoint override (e.g. a local emulator)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Directory for staging files before upload
    #[serde(rename = "scratch-dir", default)]
    pub scratch_dir: Option<PathBuf>,

    /// chrono format string for the date partition segment
    #[serde(rename = "date-format", default = "default_date_format")]
    pub date_format: String,

    /// Environment variable holding the storage secret
    #[serde(rename = "connection-string-env", default = "default_connection_string_env")]
    pub connection_string_env: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            container_name: String::new(),
            account_name: default_account_name(),
            endpoint: None,
            scratch_dir: None,
            date_format: default_date_format(),
            connection_string_env: default_connection_string_env(),
        }
    }
}

impl StorageConfig {
    /// Returns the staging directory, falling back to the system temp dir
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of in-flight fetch/store operations
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retries after a transient fetch failure
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff between retries (milliseconds), doubled per attempt
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Keep crawling after a page fails to persist
    #[serde(rename = "continue-on-persist-error", default = "default_true")]
    pub continue_on_persist_error: bool,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            continue_on_persist_error: true,
            user_agent: default_user_agent(),
        }
    }
}

/// A credential that never appears in `Debug` output or logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw secret. Never pass the result to a logging macro.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

fn default_account_name() -> String {
    "websitearchiver".to_string()
}

fn default_date_format() -> String {
    "%d%m%Y".to_string()
}

fn default_connection_string_env() -> String {
    "AZURE_BLOB_STORAGE_CONNECTION_STRING".to_string()
}

fn default_max_concurrent_requests() -> usize {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("site-archiver/{}", env!("CARGO_PKG_VERSION"))
}
