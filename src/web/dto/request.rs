//! Request DTOs for the drive API.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use super::validation::{no_control_chars, not_empty_trimmed};

/// Create folder request.
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    /// Folder name.
    pub name: String,
    /// Parent folder ID. Absent, empty or "null" means root.
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Validate for CreateFolderRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_name_field(&self.name)
    }
}

/// Rename request.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New name.
    pub name: String,
}

impl Validate for RenameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_name_field(&self.name)
    }
}

fn validate_name_field(name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Err(e) = not_empty_trimmed(name) {
        errors.add("name", e);
    }
    if let Err(e) = no_control_chars(name) {
        errors.add("name", e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Query parameters for browsing.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    /// View token: recent, starred, trash. Anything else browses by parent.
    #[serde(default)]
    pub view: Option<String>,
    /// Parent folder ID for the default view.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Query parameters for trash/restore.
#[derive(Debug, Default, Deserialize)]
pub struct TrashQuery {
    /// "true" restores instead of trashing.
    #[serde(default)]
    pub restore: Option<String>,
}

impl TrashQuery {
    pub fn is_restore(&self) -> bool {
        self.restore.as_deref() == Some("true")
    }
}

/// Query parameters for downloads.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    /// "true" asks for an attachment instead of inline display.
    #[serde(default)]
    pub download: Option<String>,
}

impl DownloadQuery {
    pub fn is_attachment(&self) -> bool {
        self.download.as_deref() == Some("true")
    }
}
