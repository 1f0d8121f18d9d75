//! Metadata catalog for filedrive.
//!
//! The catalog is the authoritative record of files and folders: names,
//! hierarchy links, star flag, soft-delete timestamp, size and storage key.
//! It never touches the blob store.
//!
//! Every query takes a [`TrashFilter`] stating whether trashed rows are
//! included. There is no implicit default.

mod file;
mod folder;

pub use file::{File, FileRepository, NewFile};
pub use folder::{Folder, FolderRepository, NewFolder};

use std::fmt;
use std::str::FromStr;

use crate::DriveError;

/// Which rows a catalog query may return with respect to soft deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashFilter {
    /// Only rows whose deletion timestamp is null.
    LiveOnly,
    /// Only rows whose deletion timestamp is set.
    TrashedOnly,
    /// Both live and trashed rows.
    Any,
}

impl TrashFilter {
    /// SQL predicate over the `deleted_at` column.
    pub(crate) fn predicate(&self) -> &'static str {
        match self {
            TrashFilter::LiveOnly => "deleted_at IS NULL",
            TrashFilter::TrashedOnly => "deleted_at IS NOT NULL",
            TrashFilter::Any => "1 = 1",
        }
    }
}

/// Kind of catalog item addressed by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    File,
    Folder,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::File => "file",
            ItemKind::Folder => "folder",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ItemKind::File),
            "folder" => Ok(ItemKind::Folder),
            other => Err(DriveError::Validation(format!("invalid item kind: {other}"))),
        }
    }
}
