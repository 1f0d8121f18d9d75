//! Browse views over the catalog.

use std::fmt;
use std::str::FromStr;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::catalog::{File, FileRepository, Folder, FolderRepository, TrashFilter};
use crate::Result;

/// Maximum number of files in the recent view.
pub const RECENT_LIMIT: u32 = 50;

/// What a browse request asks to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Live direct children of a folder, or of the root.
    #[default]
    Default,
    /// Newest live files, never folders.
    Recent,
    /// Live starred files and folders regardless of parent.
    Starred,
    /// Everything with a deletion timestamp.
    Trash,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Default => "default",
            View::Recent => "recent",
            View::Starred => "starred",
            View::Trash => "trash",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = std::convert::Infallible;

    /// Unrecognized tokens fall back to [`View::Default`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "recent" => View::Recent,
            "starred" => View::Starred,
            "trash" => View::Trash,
            _ => View::Default,
        })
    }
}

/// Files and folders returned by a browse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub files: Vec<File>,
    pub folders: Vec<Folder>,
}

/// Compute a view. `parent_id` is only consulted by [`View::Default`].
pub(crate) async fn browse(
    pool: &SqlitePool,
    view: View,
    parent_id: Option<Uuid>,
) -> Result<Listing> {
    let files = FileRepository::new(pool);
    let folders = FolderRepository::new(pool);

    let listing = match view {
        View::Default => Listing {
            files: files.list_by_parent(parent_id, TrashFilter::LiveOnly).await?,
            folders: folders
                .list_by_parent(parent_id, TrashFilter::LiveOnly)
                .await?,
        },
        View::Recent => Listing {
            files: files.list_recent(RECENT_LIMIT).await?,
            folders: Vec::new(),
        },
        View::Starred => Listing {
            files: files.list_starred().await?,
            folders: folders.list_starred().await?,
        },
        View::Trash => Listing {
            files: files.list_trashed().await?,
            folders: folders.list_trashed().await?,
        },
    };

    Ok(listing)
}
