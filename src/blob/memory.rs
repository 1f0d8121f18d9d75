//! In-memory blob store.

use std::collections::HashMap;
use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::RwLock;

use super::{generate_key, BlobReader, BlobStore, StoredBlob};
use crate::{DriveError, Result};

/// Blob store kept in process memory. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Bytes>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(
        &self,
        content: &mut (dyn AsyncRead + Send + Unpin),
        suggested_name: &str,
    ) -> Result<StoredBlob> {
        let key = generate_key(suggested_name);

        let mut buf = Vec::new();
        content
            .read_to_end(&mut buf)
            .await
            .map_err(|e| DriveError::WriteFailure(format!("blob {key}: {e}")))?;

        let size = buf.len() as u64;
        self.blobs.write().await.insert(key.clone(), Bytes::from(buf));

        Ok(StoredBlob { key, size })
    }

    async fn open(&self, key: &str) -> Result<BlobReader> {
        let blobs = self.blobs.read().await;
        let data = blobs
            .get(key)
            .cloned()
            .ok_or_else(|| DriveError::NotFound(format!("blob {key}")))?;

        Ok(Box::new(Cursor::new(data)))
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.write().await.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.blobs.read().await.contains_key(key))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
