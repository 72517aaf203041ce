//! Storage abstraction trait
//!
//! This module defines the Storage trait that all object store backends implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store facade
///
/// The pipeline only ever moves whole objects between the store and local
/// files. No retries happen at this layer; a failure aborts the owning job.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Download `bucket/key` into `destination`, creating or truncating it.
    ///
    /// Returns the number of bytes written.
    async fn download(&self, bucket: &str, key: &str, destination: &Path) -> StorageResult<u64>;

    /// Upload the file at `source` to `bucket/key` with the given content type.
    ///
    /// Returns the number of bytes uploaded.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        source: &Path,
    ) -> StorageResult<u64>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
