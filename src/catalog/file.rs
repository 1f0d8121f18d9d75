//! File records and repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::TrashFilter;
use crate::{DriveError, Result};

const FILE_COLUMNS: &str =
    "id, name, size, storage_key, parent_id, is_starred, created_at, updated_at, deleted_at";

/// A file in the catalog.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct File {
    /// Unique file ID, never reused.
    pub id: Uuid,
    /// Display name. Not unique.
    pub name: String,
    /// Size in bytes, equal to the bytes persisted in the blob store.
    pub size: i64,
    /// Opaque blob store key. Immutable and never exposed to clients.
    pub storage_key: String,
    /// Parent folder (None for root).
    pub parent_id: Option<Uuid>,
    /// Star flag.
    pub is_starred: bool,
    /// When the file was uploaded.
    pub created_at: DateTime<Utc>,
    /// Last rename or star change.
    pub updated_at: DateTime<Utc>,
    /// When the file was moved to the trash (None while live).
    pub deleted_at: Option<DateTime<Utc>>,
}

impl File {
    /// Check if the file is in the trash.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data for recording a newly uploaded file.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Display name.
    pub name: String,
    /// Blob store key returned by the save.
    pub storage_key: String,
    /// Bytes persisted.
    pub size: i64,
    /// Parent folder (None for root).
    pub parent_id: Option<Uuid>,
}

impl NewFile {
    /// Create a new NewFile in the root folder.
    pub fn new(name: impl Into<String>, storage_key: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            storage_key: storage_key.into(),
            size,
            parent_id: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: Option<Uuid>) -> Self {
        self.parent_id = parent_id;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(DriveError::Validation("file name is required".to_string()));
        }
        if self.storage_key.is_empty() {
            return Err(DriveError::Validation("storage key is required".to_string()));
        }
        if self.size < 0 {
            return Err(DriveError::Validation(format!(
                "file size must not be negative: {}",
                self.size
            )));
        }
        Ok(())
    }
}

/// Repository for file records.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a new file, assigning its identity and timestamps.
    ///
    /// Fails with `NotFound` if the parent folder is missing or trashed.
    pub async fn insert(&self, file: &NewFile) -> Result<File> {
        self.insert_within_limit(file, None).await
    }

    /// Record a new file unless it would push live usage above `limit`.
    ///
    /// The parent and quota conditions are evaluated by the INSERT itself, so
    /// a concurrent trash or upload cannot slip in between check and write.
    pub async fn insert_within_limit(&self, file: &NewFile, limit: Option<u64>) -> Result<File> {
        file.validate()?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let inserted = sqlx::query(
            "INSERT INTO files (id, name, size, storage_key, parent_id, is_starred, created_at, updated_at)
             SELECT ?, ?, ?, ?, ?, 0, ?, ?
             WHERE (? IS NULL OR EXISTS (SELECT 1 FROM folders WHERE id = ? AND deleted_at IS NULL))
               AND (? IS NULL OR
                    (SELECT COALESCE(SUM(size), 0) FROM files WHERE deleted_at IS NULL) + ? <= ?)",
        )
        .bind(id)
        .bind(&file.name)
        .bind(file.size)
        .bind(&file.storage_key)
        .bind(file.parent_id)
        .bind(now)
        .bind(now)
        .bind(file.parent_id)
        .bind(file.parent_id)
        .bind(limit)
        .bind(file.size)
        .bind(limit)
        .execute(self.pool)
        .await
        .map_err(|e| DriveError::Database(e.to_string()))?
        .rows_affected();

        if inserted == 0 {
            return Err(self.rejection(file, limit).await);
        }

        self.find(id, TrashFilter::Any).await
    }

    /// Work out which insert condition failed.
    async fn rejection(&self, file: &NewFile, limit: Option<i64>) -> DriveError {
        if let Some(parent_id) = file.parent_id {
            let live: std::result::Result<Option<i64>, sqlx::Error> =
                sqlx::query_scalar("SELECT 1 FROM folders WHERE id = ? AND deleted_at IS NULL")
                    .bind(parent_id)
                    .fetch_optional(self.pool)
                    .await;
            match live {
                Ok(None) => return DriveError::NotFound("parent folder".to_string()),
                Err(e) => return DriveError::Database(e.to_string()),
                Ok(Some(_)) => {}
            }
        }

        match self.sum_live_sizes().await {
            Ok(used) => DriveError::QuotaExceeded {
                used: used.saturating_add(file.size.unsigned_abs()),
                limit: limit.map_or(u64::MAX, |l| l.unsigned_abs()),
            },
            Err(e) => e,
        }
    }

    /// Get a file by ID, or `NotFound` if absent or excluded by the filter.
    pub async fn find(&self, id: Uuid, filter: TrashFilter) -> Result<File> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ? AND {}",
            filter.predicate()
        );
        sqlx::query_as::<_, File>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?
            .ok_or_else(|| DriveError::NotFound("file".to_string()))
    }

    /// Set or clear the deletion timestamp. Never removes the row.
    pub async fn set_trashed(&self, id: Uuid, trashed_at: Option<DateTime<Utc>>) -> Result<File> {
        let result = sqlx::query("UPDATE files SET deleted_at = ? WHERE id = ?")
            .bind(trashed_at)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DriveError::NotFound("file".to_string()));
        }

        self.find(id, TrashFilter::Any).await
    }

    /// Set the star flag.
    pub async fn set_starred(&self, id: Uuid, starred: bool) -> Result<File> {
        let result = sqlx::query("UPDATE files SET is_starred = ?, updated_at = ? WHERE id = ?")
            .bind(starred)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DriveError::NotFound("file".to_string()));
        }

        self.find(id, TrashFilter::Any).await
    }

    /// Change the display name.
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<File> {
        if name.is_empty() {
            return Err(DriveError::Validation("file name is required".to_string()));
        }

        let result = sqlx::query("UPDATE files SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DriveError::NotFound("file".to_string()));
        }

        self.find(id, TrashFilter::Any).await
    }

    /// List files directly inside a folder (None for root).
    pub async fn list_by_parent(
        &self,
        parent_id: Option<Uuid>,
        filter: TrashFilter,
    ) -> Result<Vec<File>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE parent_id IS ? AND {}
             ORDER BY created_at, rowid",
            filter.predicate()
        );
        let files = sqlx::query_as::<_, File>(&sql)
            .bind(parent_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(files)
    }

    /// List live starred files regardless of parent.
    pub async fn list_starred(&self) -> Result<Vec<File>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE is_starred = 1 AND deleted_at IS NULL
             ORDER BY created_at, rowid"
        );
        let files = sqlx::query_as::<_, File>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(files)
    }

    /// List up to `limit` live files, newest first. Ties go to the later insert.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<File>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE deleted_at IS NULL
             ORDER BY created_at DESC, rowid DESC LIMIT ?"
        );
        let files = sqlx::query_as::<_, File>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(files)
    }

    /// List trashed files, most recently trashed first.
    pub async fn list_trashed(&self) -> Result<Vec<File>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE deleted_at IS NOT NULL
             ORDER BY deleted_at DESC, rowid"
        );
        let files = sqlx::query_as::<_, File>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(files)
    }

    /// Sum of sizes over live files. Zero for an empty catalog.
    pub async fn sum_live_sizes(&self) -> Result<u64> {
        let total: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(size), 0) FROM files WHERE deleted_at IS NULL")
                .fetch_one(self.pool)
                .await
                .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(u64::try_from(total).unwrap_or(0))
    }
}
