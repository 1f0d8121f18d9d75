//! Blob storage for filedrive.
//!
//! A blob store persists raw byte streams under opaque keys and reads them
//! back as streams. It knows nothing about names, folders or trash; the
//! catalog is the only place that maps a file to its key.
//!
//! Two backends are provided:
//! - [`LocalBlobStore`]: sharded directory on the local filesystem
//! - [`MemoryBlobStore`]: process-local map, for tests and ephemeral setups

mod local;
mod memory;

pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::{DriveError, Result};

/// Readable stream over a stored blob.
///
/// Dropping the reader releases the underlying handle.
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Result of a successful [`BlobStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Opaque key for reading the blob back.
    pub key: String,
    /// Number of bytes persisted.
    pub size: u64,
}

/// Backend that persists blobs under opaque keys.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Consume `content` to the end and persist it under a fresh key.
    ///
    /// `suggested_name` is only a hint for the key's extension.
    /// Fails with [`DriveError::WriteFailure`] if the bytes cannot be persisted.
    async fn save(
        &self,
        content: &mut (dyn AsyncRead + Send + Unpin),
        suggested_name: &str,
    ) -> Result<StoredBlob>;

    /// Open a stored blob for reading.
    ///
    /// Fails with [`DriveError::NotFound`] if the key does not resolve.
    async fn open(&self, key: &str) -> Result<BlobReader>;

    /// Remove a blob. Returns `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str;
}

/// Build the blob store selected by the configuration.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend.as_str() {
        "local" => Ok(Arc::new(LocalBlobStore::new(&config.path)?)),
        "memory" => Ok(Arc::new(MemoryBlobStore::new())),
        other => Err(DriveError::Config(format!(
            "unknown storage backend: {other}"
        ))),
    }
}

/// Generate a new UUID-based key, keeping a sane extension of the suggested name.
pub(crate) fn generate_key(suggested_name: &str) -> String {
    let uuid = Uuid::new_v4();
    let ext = extract_extension(suggested_name);
    format!("{uuid}.{ext}")
}

/// Extract the file extension from a filename.
///
/// Returns "bin" if there is none or it contains anything but ASCII alphanumerics.
fn extract_extension(filename: &str) -> &str {
    Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|ext| ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin")
}
