//! Drive service: operations spanning the catalog and the blob store.

use std::sync::Arc;

use chrono::Utc;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::view::{self, Listing, View};
use super::{validate_name, Item};
use crate::blob::{BlobReader, BlobStore, StoredBlob};
use crate::catalog::{
    File, FileRepository, Folder, FolderRepository, ItemKind, NewFile, NewFolder, TrashFilter,
};
use crate::config::QuotaConfig;
use crate::db::Database;
use crate::{DriveError, Result};

/// Storage usage against the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    /// Bytes held by live files.
    pub used: u64,
    /// Configured limit in bytes.
    pub limit: u64,
}

/// How a downloaded file should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    /// Display in the client where possible.
    #[default]
    Inline,
    /// Save under the file's name.
    Attachment,
}

/// Result of a file download.
pub struct Download {
    /// File metadata.
    pub file: File,
    /// Blob content stream.
    pub content: BlobReader,
    /// Presentation hint requested by the caller.
    pub disposition: Disposition,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file", &self.file)
            .field("disposition", &self.disposition)
            .finish_non_exhaustive()
    }
}

/// Upload content saved in the blob store but not yet in the catalog.
#[derive(Debug)]
pub struct StagedUpload {
    name: String,
    blob: StoredBlob,
}

impl StagedUpload {
    /// Validated file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bytes written.
    pub fn size(&self) -> u64 {
        self.blob.size
    }
}

/// Drive service for uploads, downloads and item lifecycle.
///
/// Holds no global state: the database, blob store and quota settings are
/// injected at construction.
#[derive(Clone)]
pub struct DriveService {
    db: Database,
    blobs: Arc<dyn BlobStore>,
    quota: QuotaConfig,
}

impl DriveService {
    /// Create a new DriveService.
    pub fn new(db: Database, blobs: Arc<dyn BlobStore>, quota: QuotaConfig) -> Self {
        Self { db, blobs, quota }
    }

    /// Get the database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Upload a file.
    ///
    /// The blob is written first and recorded in the catalog only once the
    /// write succeeded. If recording fails, the blob is removed again.
    ///
    /// # Errors
    /// - `Validation` for an unusable name
    /// - `NotFound` if the parent folder is missing or trashed
    /// - `WriteFailure` if the blob store rejects the bytes
    /// - `QuotaExceeded` if enforcement is on and the upload does not fit
    pub async fn upload(
        &self,
        content: &mut (dyn AsyncRead + Send + Unpin),
        name: &str,
        parent_id: Option<Uuid>,
    ) -> Result<File> {
        validate_name(name)?;
        self.ensure_live_parent(parent_id).await?;

        let staged = self.stage_upload(content, name).await?;
        self.commit_upload(staged, parent_id).await
    }

    /// Write upload content to the blob store without recording it yet.
    ///
    /// Used when the destination is only known after the content has been
    /// read. The result must be passed to [`commit_upload`](Self::commit_upload)
    /// or [`discard_upload`](Self::discard_upload).
    pub async fn stage_upload(
        &self,
        content: &mut (dyn AsyncRead + Send + Unpin),
        name: &str,
    ) -> Result<StagedUpload> {
        let name = validate_name(name)?;
        let blob = self.blobs.save(content, &name).await?;
        debug!("Staged blob {} ({} bytes)", blob.key, blob.size);

        Ok(StagedUpload { name, blob })
    }

    /// Record a staged upload under `parent_id`. The blob is removed on failure.
    pub async fn commit_upload(&self, staged: StagedUpload, parent_id: Option<Uuid>) -> Result<File> {
        match self.record_upload(&staged, parent_id).await {
            Ok(file) => {
                info!(
                    "Uploaded file {} ({}, {} bytes) to {}",
                    file.id,
                    file.name,
                    file.size,
                    self.blobs.backend_name()
                );
                Ok(file)
            }
            Err(e) => {
                self.discard_blob(&staged.blob.key).await;
                Err(e)
            }
        }
    }

    /// Drop a staged upload that will not be recorded.
    pub async fn discard_upload(&self, staged: StagedUpload) {
        self.discard_blob(&staged.blob.key).await;
    }

    async fn record_upload(&self, staged: &StagedUpload, parent_id: Option<Uuid>) -> Result<File> {
        let size = i64::try_from(staged.blob.size).map_err(|_| {
            DriveError::WriteFailure(format!("blob too large: {} bytes", staged.blob.size))
        })?;
        let limit = self.quota.enforce.then_some(self.quota.limit_bytes);

        FileRepository::new(self.db.pool())
            .insert_within_limit(
                &NewFile::new(&staged.name, &staged.blob.key, size).with_parent(parent_id),
                limit,
            )
            .await
    }

    /// Best-effort removal of a blob that has no catalog row.
    async fn discard_blob(&self, key: &str) {
        match self.blobs.delete(key).await {
            Ok(_) => debug!("Discarded unrecorded blob {}", key),
            Err(e) => warn!("Failed to discard unrecorded blob {}: {}", key, e),
        }
    }

    async fn ensure_live_parent(&self, parent_id: Option<Uuid>) -> Result<()> {
        if let Some(parent_id) = parent_id {
            FolderRepository::new(self.db.pool())
                .find(parent_id, TrashFilter::LiveOnly)
                .await
                .map_err(|e| match e {
                    DriveError::NotFound(_) => DriveError::NotFound("parent folder".to_string()),
                    other => other,
                })?;
        }
        Ok(())
    }

    /// Create a folder.
    pub async fn create_folder(&self, name: &str, parent_id: Option<Uuid>) -> Result<Folder> {
        let name = validate_name(name)?;

        let folder = FolderRepository::new(self.db.pool())
            .insert(&NewFolder::new(name).with_parent(parent_id))
            .await?;

        info!("Created folder {} ({})", folder.id, folder.name);
        Ok(folder)
    }

    /// Rename a file or folder. Trashed items can be renamed too.
    pub async fn rename(&self, kind: ItemKind, id: Uuid, name: &str) -> Result<Item> {
        let name = validate_name(name)?;

        let item = match kind {
            ItemKind::File => Item::File(FileRepository::new(self.db.pool()).rename(id, &name).await?),
            ItemKind::Folder => {
                Item::Folder(FolderRepository::new(self.db.pool()).rename(id, &name).await?)
            }
        };

        debug!("Renamed {} {} to {}", kind, id, name);
        Ok(item)
    }

    /// Flip the star flag of a live file or folder.
    pub async fn toggle_star(&self, kind: ItemKind, id: Uuid) -> Result<Item> {
        let item = match kind {
            ItemKind::File => {
                let files = FileRepository::new(self.db.pool());
                let file = files.find(id, TrashFilter::LiveOnly).await?;
                Item::File(files.set_starred(id, !file.is_starred).await?)
            }
            ItemKind::Folder => {
                let folders = FolderRepository::new(self.db.pool());
                let folder = folders.find(id, TrashFilter::LiveOnly).await?;
                Item::Folder(folders.set_starred(id, !folder.is_starred).await?)
            }
        };

        Ok(item)
    }

    /// Move an item to the trash, or restore it when `restore` is set.
    ///
    /// Trashing a folder trashes every live descendant with the same
    /// timestamp; restoring it brings back exactly those descendants.
    /// Trashing a trashed item or restoring a live one changes nothing.
    ///
    /// # Errors
    /// - `NotFound` if the item does not exist
    /// - `Validation` when restoring an item whose parent folder is still trashed
    pub async fn set_trashed(&self, kind: ItemKind, id: Uuid, restore: bool) -> Result<Item> {
        match kind {
            ItemKind::File => self.set_file_trashed(id, restore).await.map(Item::File),
            ItemKind::Folder => self.set_folder_trashed(id, restore).await.map(Item::Folder),
        }
    }

    async fn set_file_trashed(&self, id: Uuid, restore: bool) -> Result<File> {
        let files = FileRepository::new(self.db.pool());
        let file = files.find(id, TrashFilter::Any).await?;

        if restore {
            if !file.is_trashed() {
                return Ok(file);
            }
            self.ensure_parent_restorable(file.parent_id).await?;
            let file = files.set_trashed(id, None).await?;
            info!("Restored file {} ({})", file.id, file.name);
            Ok(file)
        } else {
            if file.is_trashed() {
                return Ok(file);
            }
            let file = files.set_trashed(id, Some(Utc::now())).await?;
            info!("Trashed file {} ({})", file.id, file.name);
            Ok(file)
        }
    }

    async fn set_folder_trashed(&self, id: Uuid, restore: bool) -> Result<Folder> {
        let folders = FolderRepository::new(self.db.pool());
        let folder = folders.find(id, TrashFilter::Any).await?;

        if restore {
            if !folder.is_trashed() {
                return Ok(folder);
            }
            self.ensure_parent_restorable(folder.parent_id).await?;
            let restored = folders.restore_tree(id).await?;
            info!("Restored folder {} ({} items)", id, restored);
        } else {
            if folder.is_trashed() {
                return Ok(folder);
            }
            let trashed = folders.trash_tree(id, Utc::now()).await?;
            info!("Trashed folder {} ({} items)", id, trashed);
        }

        folders.find(id, TrashFilter::Any).await
    }

    async fn ensure_parent_restorable(&self, parent_id: Option<Uuid>) -> Result<()> {
        if let Some(parent_id) = parent_id {
            let parent = FolderRepository::new(self.db.pool())
                .find(parent_id, TrashFilter::Any)
                .await?;
            if parent.is_trashed() {
                return Err(DriveError::Validation(format!(
                    "parent folder {} is in the trash; restore it first",
                    parent.name
                )));
            }
        }
        Ok(())
    }

    /// Current storage usage. Trashed files do not count.
    pub async fn quota(&self) -> Result<QuotaUsage> {
        let used = FileRepository::new(self.db.pool()).sum_live_sizes().await?;
        Ok(QuotaUsage {
            used,
            limit: self.quota.limit_bytes,
        })
    }

    /// Open a live file for reading.
    ///
    /// # Errors
    /// - `NotFound` if there is no live file with this id
    /// - `ReadFailure` if the catalog references a blob the store cannot find
    pub async fn download(&self, id: Uuid, disposition: Disposition) -> Result<Download> {
        let file = FileRepository::new(self.db.pool())
            .find(id, TrashFilter::LiveOnly)
            .await?;

        let content = match self.blobs.open(&file.storage_key).await {
            Ok(content) => content,
            Err(DriveError::NotFound(_)) => {
                error!(
                    "Catalog and blob store diverged: file {} references missing blob {}",
                    file.id, file.storage_key
                );
                return Err(DriveError::ReadFailure(format!("content of file {}", file.id)));
            }
            Err(e) => return Err(e),
        };

        Ok(Download {
            file,
            content,
            disposition,
        })
    }

    /// Compute a browse view. `parent_id` only applies to [`View::Default`].
    pub async fn browse(&self, view: View, parent_id: Option<Uuid>) -> Result<Listing> {
        view::browse(self.db.pool(), view, parent_id).await
    }
}
