//! Storage traits and error types
//!
//! This module defines the trait interface for object store backends and
//! associated error types.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while persisting an archived object
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to stage {path}: {source}")]
    Staging {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Upload of {key} rejected with HTTP {status}: {message}")]
    Upload {
        key: String,
        status: u16,
        message: String,
    },

    #[error("Blob {key} already exists")]
    AlreadyExists { key: String },

    #[error("HTTP error uploading {key}: {source}")]
    Http { key: String, source: reqwest::Error },

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Invalid blob address: {0}")]
    InvalidAddress(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for remote object store implementations
///
/// A store is bound to one container when it is constructed. Implementations
/// must be shareable across concurrent crawl branches.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads the file at `local_path` under `key`
    ///
    /// # Arguments
    ///
    /// * `key` - Blob name inside the container (may contain `/`)
    /// * `local_path` - Staged file holding the payload
    /// * `overwrite` - Replace an existing blob with the same key
    ///
    /// # Returns
    ///
    /// The URI of the stored object
    async fn upload(&self, key: &str, local_path: &Path, overwrite: bool) -> StorageResult<String>;
}
