//! Configuration module for filedrive.

use serde::Deserialize;
use std::path::Path;

use crate::{DriveError, Result};

/// Default quota limit: 15 GiB.
pub const DEFAULT_QUOTA_LIMIT_BYTES: u64 = 15 * 1024 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/filedrive.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage backend (`local` or `memory`).
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Directory for the local backend.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_backend() -> String {
    "local".to_string()
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

/// Quota configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Storage limit in bytes.
    #[serde(default = "default_quota_limit")]
    pub limit_bytes: u64,
    /// Reject uploads that would exceed the limit. When false the quota is advisory.
    #[serde(default)]
    pub enforce: bool,
}

fn default_quota_limit() -> u64 {
    DEFAULT_QUOTA_LIMIT_BYTES
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit_bytes: default_quota_limit(),
            enforce: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filedrive.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins. Empty means any origin without credentials.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Maximum upload size in megabytes (0 = unlimited).
    #[serde(default)]
    pub max_upload_size_mb: u64,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Quota configuration.
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DriveError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DriveError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILEDRIVE_DATABASE_PATH`
    /// - `FILEDRIVE_STORAGE_PATH`
    /// - `FILEDRIVE_QUOTA_LIMIT_BYTES`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("FILEDRIVE_DATABASE_PATH") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(path) = std::env::var("FILEDRIVE_STORAGE_PATH") {
            if !path.is_empty() {
                self.storage.path = path;
            }
        }
        if let Ok(limit) = std::env::var("FILEDRIVE_QUOTA_LIMIT_BYTES") {
            match limit.parse() {
                Ok(limit) => self.quota.limit_bytes = limit,
                Err(_) => tracing::warn!("Ignoring invalid FILEDRIVE_QUOTA_LIMIT_BYTES: {limit}"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        match self.storage.backend.as_str() {
            "local" => {
                if self.storage.path.trim().is_empty() {
                    return Err(DriveError::Validation(
                        "storage.path must be set for the local backend".to_string(),
                    ));
                }
            }
            "memory" => {}
            other => {
                return Err(DriveError::Validation(format!(
                    "unknown storage backend: {other}"
                )));
            }
        }

        if self.quota.limit_bytes == 0 {
            return Err(DriveError::Validation(
                "quota.limit_bytes must be greater than zero".to_string(),
            ));
        }

        if self.database.path.trim().is_empty() {
            return Err(DriveError::Validation(
                "database.path must be set".to_string(),
            ));
        }

        Ok(())
    }
}
