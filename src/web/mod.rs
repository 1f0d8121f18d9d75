//! HTTP API for filedrive.
//!
//! A thin axum adapter over [`DriveService`](crate::drive::DriveService):
//! it parses identifiers and flags, streams uploads and downloads, and
//! maps [`DriveError`](crate::DriveError) to structured error responses.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
