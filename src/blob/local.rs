//! Local filesystem blob store.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};

use super::{generate_key, BlobReader, BlobStore, StoredBlob};
use crate::{DriveError, Result};

/// Blob store on the local filesystem.
///
/// Blobs are stored in a sharded directory structure:
/// ```text
/// {base_path}/
/// ├── ab/
/// │   └── ab12cd34-5678-90ab-cdef-123456789012.txt
/// ├── cd/
/// │   └── cd90ab12-3456-7890-abcd-ef1234567890.bin
/// └── ...
/// ```
///
/// A save writes into `{key}.part` and renames it into place once every
/// byte has been synced, so a key never resolves to a partial blob.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    /// Create a new store rooted at `base_path`.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a key to its path, rejecting anything that could escape the base directory.
    fn blob_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.contains('\0')
        {
            return Err(DriveError::NotFound(format!("blob {key}")));
        }

        Ok(self.base_path.join(Self::shard(key)).join(key))
    }

    /// First 2 characters of the key (UUID prefix).
    fn shard(key: &str) -> &str {
        key.get(..2).unwrap_or(key)
    }
}

/// Removes a partially written file unless disarmed.
struct PartialFile {
    path: Option<PathBuf>,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(mut self) {
        self.path = None;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove partial blob {:?}: {}", path, e);
                }
            }
        }
    }
}

fn write_failure(key: &str, e: io::Error) -> DriveError {
    DriveError::WriteFailure(format!("blob {key}: {e}"))
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(
        &self,
        content: &mut (dyn AsyncRead + Send + Unpin),
        suggested_name: &str,
    ) -> Result<StoredBlob> {
        let key = generate_key(suggested_name);
        let path = self.blob_path(&key)?;

        if let Some(shard_dir) = path.parent() {
            fs::create_dir_all(shard_dir)
                .await
                .map_err(|e| write_failure(&key, e))?;
        }

        let mut part_path = path.clone().into_os_string();
        part_path.push(".part");
        let part_path = PathBuf::from(part_path);

        let guard = PartialFile::new(part_path.clone());
        let mut file = fs::File::create(&part_path)
            .await
            .map_err(|e| write_failure(&key, e))?;

        let size = tokio::io::copy(content, &mut file)
            .await
            .map_err(|e| write_failure(&key, e))?;
        file.flush().await.map_err(|e| write_failure(&key, e))?;
        file.sync_all().await.map_err(|e| write_failure(&key, e))?;
        drop(file);

        fs::rename(&part_path, &path)
            .await
            .map_err(|e| write_failure(&key, e))?;
        guard.disarm();

        debug!("Saved blob {} ({} bytes) to {:?}", key, size, path);
        Ok(StoredBlob { key, size })
    }

    async fn open(&self, key: &str) -> Result<BlobReader> {
        let path = self.blob_path(key)?;

        match fs::File::open(&path).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DriveError::NotFound(format!("blob {key}")))
            }
            Err(e) => Err(DriveError::ReadFailure(format!("blob {key}: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.blob_path(key)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.blob_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}
