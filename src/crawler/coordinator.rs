//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the traversal that coordinates all aspects of an
//! archive run, including:
//! - Fetching the root document and archiving its stylesheets
//! - Filtering anchor links down to in-scope pages
//! - Depth-first, pre-order recursion with at-most-once visitation
//! - Handing every fetched document to the archive writer
//! - Tallying the run summary

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::parser::Document;
use crate::output::CrawlSummary;
use crate::state::{CrawlState, PageOutcome, ResourceKind};
use crate::storage::{
    ArchiveWriter, AzureBlobStore, DEFAULT_EXTENSION, ROOT_DOCUMENT_TOKEN, STYLESHEET_EXTENSION,
};
use crate::url::{DomainRoot, LinkDecision, LinkFilter};
use crate::{ArchiverError, ConfigError};
use futures::future::BoxFuture;
use futures::stream::{self, TryStreamExt};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::Semaphore;

/// State owned by a single crawl run, discarded when the run ends
struct CrawlRun {
    state: CrawlState,
    summary: Mutex<CrawlSummary>,
}

impl CrawlRun {
    fn new() -> Self {
        Self {
            state: CrawlState::new(),
            summary: Mutex::new(CrawlSummary::default()),
        }
    }

    fn record(&self, kind: ResourceKind, outcome: PageOutcome) {
        self.summary
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(kind, outcome);
    }

    fn finish(self, started: Instant) -> CrawlSummary {
        let mut summary = self
            .summary
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        summary.pages_visited = self.state.visited_count();
        summary.elapsed = started.elapsed();
        summary
    }
}

/// Main crawler structure
///
/// Walks one site from its root, archiving every in-scope page it reaches.
pub struct Crawler {
    fetcher: Fetcher,
    writer: ArchiveWriter,
    filter: LinkFilter,
    limiter: Semaphore,
    max_concurrent_requests: usize,
    continue_on_persist_error: bool,
}

impl Crawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `config` - The archiver configuration
    /// * `writer` - Where fetched documents are persisted
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Successfully created crawler
    /// * `Err(ArchiverError)` - Invalid domain root or HTTP client setup failed
    pub fn new(config: &Config, writer: ArchiveWriter) -> Result<Self, ArchiverError> {
        let domain_root = DomainRoot::parse(&config.site.domain_root)?;
        let client = build_http_client(&config.crawler)?;
        let max_concurrent_requests = config.crawler.max_concurrent_requests.max(1);

        Ok(Self {
            fetcher: Fetcher::new(client, &config.crawler),
            writer,
            filter: LinkFilter::new(domain_root, config.site.relative_links),
            limiter: Semaphore::new(max_concurrent_requests),
            max_concurrent_requests,
            continue_on_persist_error: config.crawler.continue_on_persist_error,
        })
    }

    /// Crawls the site reachable from `root_address`
    ///
    /// This method:
    /// 1. Fetches the root document (failure aborts the run)
    /// 2. Archives every stylesheet the root document links
    /// 3. Archives the root document under the `main` token
    /// 4. Recursively follows in-scope anchors, depth-first
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - Crawl completed; non-root failures are counted, not raised
    /// * `Err(ArchiverError)` - Root fetch failed, or a persist failed with
    ///   `continue-on-persist-error` disabled
    pub async fn crawl(&self, root_address: &str) -> Result<CrawlSummary, ArchiverError> {
        let started = Instant::now();
        let run = CrawlRun::new();

        tracing::info!("Starting crawl of {}", root_address);

        let root = self.fetcher.fetch_document(root_address).await?;
        run.state.mark_visited(root_address);

        self.crawl_stylesheets(&root, &run).await?;

        self.persist(
            ROOT_DOCUMENT_TOKEN,
            root.body(),
            Some(DEFAULT_EXTENSION),
            ResourceKind::Page,
            &run,
        )
        .await?;

        self.crawl_links(&root, &run).await?;

        let summary = run.finish(started);
        tracing::info!(
            "Crawl completed: {} pages stored, {} stylesheets stored, {} failures in {:?}",
            summary.pages_stored,
            summary.stylesheets_stored,
            summary.total_failures(),
            summary.elapsed
        );

        Ok(summary)
    }

    /// Archives the stylesheets linked from `document`
    ///
    /// Stylesheet hrefs are not run through the link filter. Each is resolved
    /// against the domain root and stored by file name, with no directory and
    /// the extension pinned to `css`.
    async fn crawl_stylesheets(&self, document: &Document, run: &CrawlRun) -> Result<(), ArchiverError> {
        let root = self.filter.root();

        for href in document.stylesheet_hrefs() {
            let Some(file_name) = root.file_name(&href) else {
                tracing::debug!("Skipping stylesheet without a file name: {}", href);
                continue;
            };

            let address = match root.resolve(&href) {
                Ok(address) => address,
                Err(e) => {
                    tracing::warn!("Cannot resolve stylesheet {}: {}", href, e);
                    run.record(ResourceKind::Stylesheet, PageOutcome::FetchFailed);
                    continue;
                }
            };

            tracing::info!("Storing {}", file_name);

            let content = {
                let _permit = self.permit().await?;
                match self.fetcher.fetch_raw(address.as_str()).await {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!("Failed to fetch stylesheet {}: {}", address, e);
                        run.record(ResourceKind::Stylesheet, PageOutcome::FetchFailed);
                        continue;
                    }
                }
            };

            self.persist(
                &file_name,
                &content,
                Some(STYLESHEET_EXTENSION),
                ResourceKind::Stylesheet,
                run,
            )
            .await?;
        }

        Ok(())
    }

    /// Returns the in-scope links of `document`, in document order
    fn qualifying_links(&self, document: &Document) -> Vec<String> {
        document
            .anchor_hrefs()
            .into_iter()
            .filter_map(|href| match self.filter.evaluate(&href, document.address()) {
                LinkDecision::Follow(address) => Some(address),
                decision => {
                    tracing::debug!("Not following {} ({:?})", href, decision);
                    None
                }
            })
            .collect()
    }

    /// Crawls every qualifying link of `document`
    ///
    /// Siblings are expanded one after another when concurrency is 1, which
    /// gives a strict depth-first, pre-order traversal.
    async fn crawl_links(&self, document: &Document, run: &CrawlRun) -> Result<(), ArchiverError> {
        let links = self.qualifying_links(document);

        stream::iter(links.into_iter().map(Ok::<String, ArchiverError>))
            .try_for_each_concurrent(self.max_concurrent_requests, |link| {
                self.crawl_link(link, run)
            })
            .await
    }

    /// Visits `address` unless some branch already has
    ///
    /// The address is marked visited before it is fetched, so cycles back to
    /// it terminate. A failed fetch abandons only this branch.
    fn crawl_link<'a>(
        &'a self,
        address: String,
        run: &'a CrawlRun,
    ) -> BoxFuture<'a, Result<(), ArchiverError>> {
        Box::pin(async move {
            if !run.state.mark_visited(&address) {
                tracing::info!("Already visited {}", address);
                run.record(ResourceKind::Page, PageOutcome::AlreadyVisited);
                return Ok(());
            }

            let document = {
                let _permit = self.permit().await?;
                let document = match self.fetcher.fetch_document(&address).await {
                    Ok(document) => document,
                    Err(e) => {
                        tracing::warn!("Failed to fetch {}: {}", address, e);
                        run.record(ResourceKind::Page, PageOutcome::FetchFailed);
                        return Ok(());
                    }
                };

                self.persist(&address, document.body(), None, ResourceKind::Page, run)
                    .await?;
                document
            };

            tracing::info!("Crawling {}", address);
            self.crawl_links(&document, run).await
        })
    }

    /// Hands content to the archive writer and records the outcome
    async fn persist(
        &self,
        source: &str,
        content: &[u8],
        explicit_extension: Option<&str>,
        kind: ResourceKind,
        run: &CrawlRun,
    ) -> Result<(), ArchiverError> {
        match self.writer.store(source, content, explicit_extension).await {
            Ok(stored) => {
                tracing::info!("Stored {} as blob: {}", source, stored.uri);
                run.record(kind, PageOutcome::Stored);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to store {}: {}", source, e);
                run.record(kind, PageOutcome::PersistFailed);
                if self.continue_on_persist_error {
                    Ok(())
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Waits for a fetch/store slot
    async fn permit(&self) -> Result<tokio::sync::SemaphorePermit<'_>, ArchiverError> {
        self.limiter
            .acquire()
            .await
            .map_err(|_| ArchiverError::Aborted("request limiter closed".to_string()))
    }
}

/// Runs a complete archive of the configured site
///
/// This function wires the configured Azure container, the archive writer
/// and the crawler together, then crawls from the domain root.
///
/// # Arguments
///
/// * `config` - The validated archiver configuration
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(ArchiverError)` - Setup failed or the crawl aborted
///
/// # Example
///
/// ```no_run
/// use site_archiver::config::load_config_from_env;
/// use site_archiver::crawler::run_archive;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config_from_env()?;
/// let summary = run_archive(&config).await?;
/// println!("Stored {} pages", summary.pages_stored);
/// # Ok(())
/// # }
/// ```
pub async fn run_archive(config: &Config) -> Result<CrawlSummary, ArchiverError> {
    let secret = config.secret.as_ref().ok_or_else(|| {
        ConfigError::MissingEnv(config.storage.connection_string_env.clone())
    })?;

    let domain_root = DomainRoot::parse(&config.site.domain_root)?;
    let client = build_http_client(&config.crawler)?;
    let store = AzureBlobStore::from_config(client, &config.storage, secret)?;

    tracing::info!(
        "Archiving into container '{}' at {}",
        store.container(),
        config.storage.endpoint.as_deref().unwrap_or("the default endpoint")
    );

    let writer = ArchiveWriter::new(Arc::new(store), domain_root.clone(), &config.storage);
    let crawler = Crawler::new(config, writer)?;

    crawler.crawl(domain_root.as_str()).await
}
