//! Middleware for the drive API.

pub mod cors;

pub use cors::create_cors_layer;
