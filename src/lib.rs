//! filedrive - a personal file drive.
//!
//! Stores file content in a pluggable blob store, keeps metadata in SQLite,
//! and exposes browse views, trash with recursive restore, and a storage
//! quota over a small HTTP API.

pub mod blob;
pub mod catalog;
pub mod config;
pub mod db;
pub mod drive;
pub mod error;
pub mod logging;
pub mod web;

pub use blob::{open_store, BlobStore, LocalBlobStore, MemoryBlobStore, StoredBlob};
pub use catalog::{File, Folder, ItemKind, TrashFilter};
pub use config::Config;
pub use db::Database;
pub use drive::{Disposition, Download, DriveService, Item, Listing, QuotaUsage, View};
pub use error::{DriveError, ErrorKind, Result};
pub use web::WebServer;
