//! Archive writer
//!
//! Turns a (source address, content) pair into a stored blob: derives the
//! storage key, stages the content to a scratch file, uploads it and removes
//! the scratch file again.

use crate::config::StorageConfig;
use crate::storage::key::StorageKey;
use crate::storage::traits::{ObjectStore, StorageError, StorageResult};
use crate::url::DomainRoot;
use chrono::{Local, NaiveDate};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// An object that was written to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: StorageKey,
    pub uri: String,
}

/// Persists fetched documents under derived storage keys
pub struct ArchiveWriter {
    store: Arc<dyn ObjectStore>,
    domain_root: DomainRoot,
    scratch_dir: PathBuf,
    date_format: String,
    pinned_date: Option<NaiveDate>,
}

impl ArchiveWriter {
    /// Creates a writer that uploads into `store`
    ///
    /// # Arguments
    ///
    /// * `store` - The object store bound to the target container
    /// * `domain_root` - Prefix stripped from addresses before naming
    /// * `config` - Scratch directory and date partition format
    pub fn new(store: Arc<dyn ObjectStore>, domain_root: DomainRoot, config: &StorageConfig) -> Self {
        Self {
            store,
            domain_root,
            scratch_dir: config.scratch_dir(),
            date_format: config.date_format.clone(),
            pinned_date: None,
        }
    }

    /// Uses `date` for every date partition instead of the local calendar date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.pinned_date = Some(date);
        self
    }

    /// The calendar date used for the next key
    pub fn today(&self) -> NaiveDate {
        self.pinned_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Derives the key `source` would be stored under today
    pub fn derive_key(&self, source: &str, explicit_extension: Option<&str>) -> StorageKey {
        StorageKey::derive(
            source,
            &self.domain_root,
            explicit_extension,
            self.today(),
            &self.date_format,
        )
    }

    /// Stores `content` under the key derived from `source`
    ///
    /// Existing blobs with the same key are overwritten, so storing the same
    /// address twice on one day keeps the latest content. The scratch file is
    /// removed whether or not the upload succeeds.
    ///
    /// # Arguments
    ///
    /// * `source` - Address (or token) the content came from
    /// * `content` - Raw bytes to persist, unchanged
    /// * `explicit_extension` - Extension to use instead of inferring one
    ///
    /// # Returns
    ///
    /// * `Ok(StoredObject)` - Key and remote URI of the stored blob
    /// * `Err(StorageError)` - Staging or upload failed
    pub async fn store(
        &self,
        source: &str,
        content: &[u8],
        explicit_extension: Option<&str>,
    ) -> StorageResult<StoredObject> {
        let key = self.derive_key(source, explicit_extension);
        let blob_name = key.to_string();

        tracing::debug!("Uploading {} as {}", source, blob_name);

        let scratch = self.stage(&key, content).await?;
        let result = self.store.upload(&blob_name, scratch.path(), true).await;
        self.discard(scratch);

        let uri = result?;
        Ok(StoredObject { key, uri })
    }

    /// Writes `content` to a scratch file unique to this call
    ///
    /// The file is deleted when the returned handle is dropped, including on
    /// early returns. Filesystem work runs on the blocking pool.
    async fn stage(&self, key: &StorageKey, content: &[u8]) -> StorageResult<NamedTempFile> {
        let scratch_dir = self.scratch_dir.clone();
        let local_name = key.local_name();
        let content = content.to_vec();
        let path = scratch_dir.join(&local_name);

        let staged = tokio::task::spawn_blocking(move || {
            write_scratch(&scratch_dir, &local_name, &content)
        })
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
        .and_then(|staged| staged);

        staged.map_err(|source| StorageError::Staging { path, source })
    }

    fn discard(&self, scratch: NamedTempFile) {
        let path = scratch.path().to_path_buf();
        match scratch.close() {
            Ok(()) => tracing::debug!("Removed local file at location: {}", path.display()),
            Err(e) => tracing::warn!("Failed to remove local file {}: {}", path.display(), e),
        }
    }
}

fn write_scratch(
    scratch_dir: &Path,
    local_name: &str,
    content: &[u8],
) -> std::io::Result<NamedTempFile> {
    std::fs::create_dir_all(scratch_dir)?;

    let mut scratch = tempfile::Builder::new()
        .prefix(&format!("{}.", local_name))
        .tempfile_in(scratch_dir)?;

    scratch.write_all(content)?;
    scratch.flush()?;

    Ok(scratch)
}
