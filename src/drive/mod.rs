//! Drive lifecycle and views for filedrive.
//!
//! This module ties the catalog and the blob store together:
//! - Upload (blob first, then metadata) and download
//! - Folder creation, rename, star and trash/restore
//! - Quota accounting over live files
//! - Browse views (default, recent, starred, trash)

mod service;
mod view;

pub use service::{Disposition, Download, DriveService, QuotaUsage, StagedUpload};
pub use view::{Listing, View, RECENT_LIMIT};

use crate::catalog::{File, Folder, ItemKind};
use crate::{DriveError, Result};

/// Maximum length for file and folder names (in characters).
pub const MAX_NAME_LENGTH: usize = 255;

/// A file or folder returned by operations that accept either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    File(File),
    Folder(Folder),
}

impl Item {
    /// Kind of the wrapped record.
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::File(_) => ItemKind::File,
            Item::Folder(_) => ItemKind::Folder,
        }
    }

    /// Display name of the wrapped record.
    pub fn name(&self) -> &str {
        match self {
            Item::File(file) => &file.name,
            Item::Folder(folder) => &folder.name,
        }
    }

    /// Check if the wrapped record is in the trash.
    pub fn is_trashed(&self) -> bool {
        match self {
            Item::File(file) => file.is_trashed(),
            Item::Folder(folder) => folder.is_trashed(),
        }
    }
}

/// Trim a display name and check it is usable.
///
/// Rejects empty names, names longer than [`MAX_NAME_LENGTH`] characters,
/// and names containing control characters or `/`.
pub fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(DriveError::Validation("name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(DriveError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    if name.chars().any(|c| c.is_control() || c == '/') {
        return Err(DriveError::Validation(
            "name must not contain control characters or '/'".to_string(),
        ));
    }

    Ok(name.to_string())
}
