//! Response DTOs for the drive API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{File, Folder};
use crate::drive::{Item, Listing, QuotaUsage};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// File as seen by clients. The storage key is never included.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub name: String,
    pub size: i64,
    pub parent_id: Option<Uuid>,
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<File> for FileResponse {
    fn from(file: File) -> Self {
        Self {
            id: file.id,
            name: file.name,
            size: file.size,
            parent_id: file.parent_id,
            is_starred: file.is_starred,
            created_at: file.created_at,
            updated_at: file.updated_at,
            deleted_at: file.deleted_at,
        }
    }
}

/// Folder as seen by clients.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_id: folder.parent_id,
            is_starred: folder.is_starred,
            created_at: folder.created_at,
            updated_at: folder.updated_at,
            deleted_at: folder.deleted_at,
        }
    }
}

/// Either a file or a folder.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ItemResponse {
    File(FileResponse),
    Folder(FolderResponse),
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        match item {
            Item::File(file) => ItemResponse::File(file.into()),
            Item::Folder(folder) => ItemResponse::Folder(folder.into()),
        }
    }
}

/// Browse result.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub files: Vec<FileResponse>,
    pub folders: Vec<FolderResponse>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            files: listing.files.into_iter().map(Into::into).collect(),
            folders: listing.folders.into_iter().map(Into::into).collect(),
        }
    }
}

/// Storage usage.
#[derive(Debug, Serialize)]
pub struct StorageResponse {
    /// Bytes held by live files.
    pub used: u64,
    /// Quota limit in bytes.
    pub limit: u64,
}

impl From<QuotaUsage> for StorageResponse {
    fn from(usage: QuotaUsage) -> Self {
        Self {
            used: usage.used,
            limit: usage.limit,
        }
    }
}

/// Status-only response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}
