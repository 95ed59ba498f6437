//! Storage module for persisting archived documents
//!
//! This module handles everything between a fetched document and a durable
//! blob, including:
//! - Deriving date-partitioned storage keys from page addresses
//! - Staging content to scratch files and guaranteeing their cleanup
//! - Uploading to Azure Blob Storage through the `ObjectStore` trait

mod azure;
mod key;
mod traits;
mod writer;

pub use azure::{AzureBlobStore, StorageAccount};
pub use key::{StorageKey, DEFAULT_EXTENSION, ROOT_DOCUMENT_TOKEN, STYLESHEET_EXTENSION};
pub use traits::{ObjectStore, StorageError, StorageResult};
pub use writer::{ArchiveWriter, StoredObject};
