//! Shared fixtures for the integration tests

use async_trait::async_trait;
use chrono::NaiveDate;
use site_archiver::config::{Config, CrawlerConfig, RelativeLinkPolicy, SiteConfig, StorageConfig};
use site_archiver::storage::{ArchiveWriter, ObjectStore, StorageError, StorageResult};
use site_archiver::url::DomainRoot;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Date every test archive is partitioned under
pub fn archive_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
}

/// Date partition produced by [`archive_date`] with the default format
pub const DATE_SEGMENT: &str = "09032024";

/// In-memory object store that records every upload
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    uploads: Mutex<Vec<String>>,
    staged_paths: Mutex<Vec<PathBuf>>,
    failing: HashSet<String>,
}

impl MemoryStore {
    /// A store that rejects uploads for the given keys
    pub fn failing_on(keys: &[&str]) -> Self {
        Self {
            failing: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Every upload attempt, in order, including rejected ones
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    /// Scratch files handed to the store
    pub fn staged_paths(&self) -> Vec<PathBuf> {
        self.staged_paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, key: &str, local_path: &Path, _overwrite: bool) -> StorageResult<String> {
        self.uploads.lock().unwrap().push(key.to_string());
        self.staged_paths.lock().unwrap().push(local_path.to_path_buf());

        if self.failing.contains(key) {
            return Err(StorageError::Upload {
                key: key.to_string(),
                status: 500,
                message: "injected failure".to_string(),
            });
        }

        let content = std::fs::read(local_path).map_err(|source| StorageError::Staging {
            path: local_path.to_path_buf(),
            source,
        })?;
        self.objects.lock().unwrap().insert(key.to_string(), content);

        Ok(format!("memory://archive/{}", key))
    }
}

/// Creates a test configuration rooted at `domain_root`
pub fn create_test_config(domain_root: &str, scratch_dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            domain_root: domain_root.to_string(),
            relative_links: RelativeLinkPolicy::Resolve,
        },
        storage: StorageConfig {
            container_name: "archive".to_string(),
            scratch_dir: Some(scratch_dir.to_path_buf()),
            ..StorageConfig::default()
        },
        crawler: CrawlerConfig {
            max_concurrent_requests: 1,
            request_timeout_secs: 5,
            max_retries: 0,
            retry_delay_ms: 1,
            ..CrawlerConfig::default()
        },
        secret: None,
    }
}

/// Archive writer that uploads into `store` under [`archive_date`]
pub fn create_writer(config: &Config, store: Arc<MemoryStore>) -> ArchiveWriter {
    let root = DomainRoot::parse(&config.site.domain_root).unwrap();
    ArchiveWriter::new(store, root, &config.storage).with_date(archive_date())
}

/// Blob key for `name` under today's test partition
pub fn key(name: &str) -> String {
    format!("{}/{}", DATE_SEGMENT, name)
}

/// Wraps anchors and stylesheet links in a minimal page
pub fn page(stylesheets: &[&str], anchors: &[&str]) -> String {
    let links: String = stylesheets
        .iter()
        .map(|href| format!(r#"<link rel="stylesheet" href="{}">"#, href))
        .collect();
    let body: String = anchors
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        "<html><head>{}</head><body>{}</body></html>",
        links, body
    )
}

/// Returns the entries left in `dir`
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}
