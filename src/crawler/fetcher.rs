//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Fetching pages as parsed documents
//! - Fetching stylesheets as raw bytes
//! - Retry with exponential backoff for transient failures

use crate::config::CrawlerConfig;
use crate::crawler::parser::Document;
use crate::FetchError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Upper bound for a single backoff delay
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves addresses over HTTP
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | HTTP 429, 5xx | Retry with backoff |
/// | Other HTTP status | Fail immediately |
/// | Timeout | Retry with backoff |
/// | Connection error | Retry with backoff |
/// | Invalid address | Fail immediately |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Fetches `address` as a document, keeping the body bytes undecoded
    pub async fn fetch_document(&self, address: &str) -> Result<Document, FetchError> {
        let body = self.fetch_raw(address).await?;
        Ok(Document::new(address, body))
    }

    /// Fetches `address` as raw bytes, without any decoding
    pub async fn fetch_raw(&self, address: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get_with_retry(address).await?;
        let bytes = response.bytes().await.map_err(|e| classify(address, e))?;
        Ok(bytes.to_vec())
    }

    async fn get_with_retry(&self, address: &str) -> Result<Response, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get(address).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} in {:?} (attempt {}/{}): {}",
                        address,
                        delay,
                        attempt,
                        self.max_retries,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Delay before retry number `attempt + 1`, doubling per attempt up to a cap
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    async fn get(&self, address: &str) -> Result<Response, FetchError> {
        let url = reqwest::Url::parse(address).map_err(|_| FetchError::InvalidAddress {
            url: address.to_string(),
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(address, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: address.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

/// Maps a transport error onto the fetch error taxonomy
fn classify(address: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: address.to_string(),
        }
    } else {
        FetchError::Http {
            url: address.to_string(),
            source: error,
        }
    }
}
