//! API handlers for the drive.

pub mod drive;

pub use drive::*;

use crate::drive::DriveService;

/// Shared application state.
pub struct AppState {
    /// Drive service.
    pub drive: DriveService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(drive: DriveService) -> Self {
        Self { drive }
    }
}
