//! Folder records and repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::TrashFilter;
use crate::{DriveError, Result};

const FOLDER_COLUMNS: &str = "id, name, parent_id, is_starred, created_at, updated_at, deleted_at";

/// Live folders reachable from the seed folder, the seed included.
const LIVE_SUBTREE: &str = "WITH RECURSIVE tree(id) AS (
    SELECT id FROM folders WHERE id = ?
    UNION ALL
    SELECT f.id FROM folders f JOIN tree t ON f.parent_id = t.id WHERE f.deleted_at IS NULL
)";

/// Folders reachable from the seed through folders carrying the given stamp.
const STAMPED_SUBTREE: &str = "WITH RECURSIVE tree(id) AS (
    SELECT id FROM folders WHERE id = ?
    UNION ALL
    SELECT f.id FROM folders f JOIN tree t ON f.parent_id = t.id WHERE f.deleted_at = ?
)";

/// A folder in the catalog.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: Uuid,
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<Uuid>,
    /// Star flag.
    pub is_starred: bool,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// Last rename or star change.
    pub updated_at: DateTime<Utc>,
    /// When the folder was moved to the trash (None while live).
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Folder {
    /// Check if the folder is in the trash.
    pub fn is_trashed(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Parent folder ID (None for root folders).
    pub parent_id: Option<Uuid>,
}

impl NewFolder {
    /// Create a new NewFolder in the root.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
        }
    }

    /// Set the parent folder.
    pub fn with_parent(mut self, parent_id: Option<Uuid>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new folder. Fails with `NotFound` if the parent is missing or trashed.
    pub async fn insert(&self, folder: &NewFolder) -> Result<Folder> {
        if folder.name.is_empty() {
            return Err(DriveError::Validation("folder name is required".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO folders (id, name, parent_id, is_starred, created_at, updated_at)
             SELECT ?, ?, ?, 0, ?, ?
             WHERE ? IS NULL OR EXISTS (SELECT 1 FROM folders WHERE id = ? AND deleted_at IS NULL)",
        )
        .bind(id)
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(now)
        .bind(now)
        .bind(folder.parent_id)
        .bind(folder.parent_id)
        .execute(self.pool)
        .await
        .map_err(|e| DriveError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DriveError::NotFound("parent folder".to_string()));
        }

        self.find(id, TrashFilter::Any).await
    }

    /// Get a folder by ID, or `NotFound` if absent or excluded by the filter.
    pub async fn find(&self, id: Uuid, filter: TrashFilter) -> Result<Folder> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ? AND {}",
            filter.predicate()
        );
        sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?
            .ok_or_else(|| DriveError::NotFound("folder".to_string()))
    }

    /// Trash a folder together with every live descendant.
    ///
    /// All affected rows carry the same timestamp so that
    /// [`restore_tree`](Self::restore_tree) can tell them apart from items
    /// trashed on their own earlier. Returns the number of rows stamped.
    pub async fn trash_tree(&self, id: Uuid, trashed_at: DateTime<Utc>) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        // Files first: the walk below stops at folders that are no longer live.
        let files = sqlx::query(&format!(
            "{LIVE_SUBTREE}
             UPDATE files SET deleted_at = ?
             WHERE deleted_at IS NULL AND parent_id IN (SELECT id FROM tree)"
        ))
        .bind(id)
        .bind(trashed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DriveError::Database(e.to_string()))?;

        let folders = sqlx::query(&format!(
            "{LIVE_SUBTREE}
             UPDATE folders SET deleted_at = ?
             WHERE deleted_at IS NULL AND id IN (SELECT id FROM tree)"
        ))
        .bind(id)
        .bind(trashed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DriveError::Database(e.to_string()))?;

        if folders.rows_affected() == 0 {
            return Err(DriveError::NotFound("folder".to_string()));
        }

        tx.commit()
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(files.rows_affected() + folders.rows_affected())
    }

    /// Restore a trashed folder and exactly the descendants trashed with it.
    ///
    /// Returns the number of rows restored.
    pub async fn restore_tree(&self, id: Uuid) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        // Raw column text, so the comparison below is exact.
        let stamp: Option<String> =
            sqlx::query_scalar("SELECT deleted_at FROM folders WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DriveError::Database(e.to_string()))?
                .ok_or_else(|| DriveError::NotFound("folder".to_string()))?;

        let Some(stamp) = stamp else {
            return Ok(0);
        };

        let files = sqlx::query(&format!(
            "{STAMPED_SUBTREE}
             UPDATE files SET deleted_at = NULL
             WHERE deleted_at = ? AND parent_id IN (SELECT id FROM tree)"
        ))
        .bind(id)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| DriveError::Database(e.to_string()))?;

        let folders = sqlx::query(&format!(
            "{STAMPED_SUBTREE}
             UPDATE folders SET deleted_at = NULL
             WHERE deleted_at = ? AND id IN (SELECT id FROM tree)"
        ))
        .bind(id)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| DriveError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(files.rows_affected() + folders.rows_affected())
    }

    /// Set the star flag.
    pub async fn set_starred(&self, id: Uuid, starred: bool) -> Result<Folder> {
        let result =
            sqlx::query("UPDATE folders SET is_starred = ?, updated_at = ? WHERE id = ?")
                .bind(starred)
                .bind(Utc::now())
                .bind(id)
                .execute(self.pool)
                .await
                .map_err(|e| DriveError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DriveError::NotFound("folder".to_string()));
        }

        self.find(id, TrashFilter::Any).await
    }

    /// Change the folder name.
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Folder> {
        if name.is_empty() {
            return Err(DriveError::Validation("folder name is required".to_string()));
        }

        let result = sqlx::query("UPDATE folders SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DriveError::NotFound("folder".to_string()));
        }

        self.find(id, TrashFilter::Any).await
    }

    /// List child folders of a parent (None for root).
    pub async fn list_by_parent(
        &self,
        parent_id: Option<Uuid>,
        filter: TrashFilter,
    ) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE parent_id IS ? AND {}
             ORDER BY created_at, rowid",
            filter.predicate()
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(parent_id)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// List live starred folders regardless of parent.
    pub async fn list_starred(&self) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE is_starred = 1 AND deleted_at IS NULL
             ORDER BY created_at, rowid"
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(folders)
    }

    /// List trashed folders, most recently trashed first.
    pub async fn list_trashed(&self) -> Result<Vec<Folder>> {
        let sql = format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE deleted_at IS NOT NULL
             ORDER BY deleted_at DESC, rowid"
        );
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| DriveError::Database(e.to_string()))?;

        Ok(folders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FileRepository, NewFile};
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_folder() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo.insert(&NewFolder::new("写真")).await.unwrap();

        assert_eq!(folder.name, "写真");
        assert!(folder.parent_id.is_none());
        assert!(!folder.is_starred);
        assert!(!folder.is_trashed());
    }

    #[tokio::test]
    async fn test_insert_empty_name() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let result = repo.insert(&NewFolder::new("")).await;
        assert!(matches!(result, Err(DriveError::Validation(_))));
    }

    #[tokio::test]
    async fn test_insert_with_unknown_parent_fails() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let result = repo
            .insert(&NewFolder::new("orphan").with_parent(Some(Uuid::new_v4())))
            .await;
        assert!(matches!(result, Err(DriveError::Database(_))));
    }

    #[tokio::test]
    async fn test_list_by_parent() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let root_a = repo.insert(&NewFolder::new("A")).await.unwrap();
        let root_b = repo.insert(&NewFolder::new("B")).await.unwrap();
        let child = repo
            .insert(&NewFolder::new("A1").with_parent(Some(root_a.id)))
            .await
            .unwrap();

        let roots = repo.list_by_parent(None, TrashFilter::LiveOnly).await.unwrap();
        let root_ids: Vec<Uuid> = roots.iter().map(|f| f.id).collect();
        assert_eq!(root_ids, vec![root_a.id, root_b.id]);

        let children = repo
            .list_by_parent(Some(root_a.id), TrashFilter::LiveOnly)
            .await
            .unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, child.id);
    }

    #[tokio::test]
    async fn test_rename_and_star() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo.insert(&NewFolder::new("Old")).await.unwrap();

        let renamed = repo.rename(folder.id, "New").await.unwrap();
        assert_eq!(renamed.name, "New");
        assert!(renamed.updated_at >= folder.updated_at);

        let starred = repo.set_starred(folder.id, true).await.unwrap();
        assert!(starred.is_starred);
        assert_eq!(repo.list_starred().await.unwrap().len(), 1);

        assert!(matches!(
            repo.rename(Uuid::new_v4(), "x").await,
            Err(DriveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_trash_tree_cascades() {
        let db = setup_db().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        let top = folders.insert(&NewFolder::new("top")).await.unwrap();
        let sub = folders
            .insert(&NewFolder::new("sub").with_parent(Some(top.id)))
            .await
            .unwrap();
        let deep = files
            .insert(&NewFile::new("deep.txt", "k1", 4).with_parent(Some(sub.id)))
            .await
            .unwrap();
        let outside = files.insert(&NewFile::new("out.txt", "k2", 2)).await.unwrap();

        let stamped = folders.trash_tree(top.id, Utc::now()).await.unwrap();
        assert_eq!(stamped, 3);

        assert!(folders.find(sub.id, TrashFilter::TrashedOnly).await.is_ok());
        assert!(files.find(deep.id, TrashFilter::TrashedOnly).await.is_ok());
        assert!(files.find(outside.id, TrashFilter::LiveOnly).await.is_ok());
        assert_eq!(files.sum_live_sizes().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_restore_tree_keeps_independently_trashed() {
        let db = setup_db().await;
        let folders = FolderRepository::new(db.pool());
        let files = FileRepository::new(db.pool());

        let top = folders.insert(&NewFolder::new("top")).await.unwrap();
        let earlier = files
            .insert(&NewFile::new("earlier.txt", "k1", 1).with_parent(Some(top.id)))
            .await
            .unwrap();
        let with_folder = files
            .insert(&NewFile::new("with.txt", "k2", 1).with_parent(Some(top.id)))
            .await
            .unwrap();

        files
            .set_trashed(earlier.id, Some(Utc::now() - chrono::Duration::minutes(5)))
            .await
            .unwrap();
        folders.trash_tree(top.id, Utc::now()).await.unwrap();

        let restored = folders.restore_tree(top.id).await.unwrap();
        assert_eq!(restored, 2);

        assert!(folders.find(top.id, TrashFilter::LiveOnly).await.is_ok());
        assert!(files.find(with_folder.id, TrashFilter::LiveOnly).await.is_ok());
        assert!(files.find(earlier.id, TrashFilter::TrashedOnly).await.is_ok());
    }

    #[tokio::test]
    async fn test_restore_tree_live_folder_is_noop() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let folder = repo.insert(&NewFolder::new("live")).await.unwrap();

        assert_eq!(repo.restore_tree(folder.id).await.unwrap(), 0);
        assert!(matches!(
            repo.restore_tree(Uuid::new_v4()).await,
            Err(DriveError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_under_trashed_parent() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let top = repo.insert(&NewFolder::new("top")).await.unwrap();
        repo.trash_tree(top.id, Utc::now()).await.unwrap();

        let result = repo
            .insert(&NewFolder::new("child").with_parent(Some(top.id)))
            .await;
        assert!(matches!(result, Err(DriveError::NotFound(_))));
        assert!(repo
            .list_by_parent(Some(top.id), TrashFilter::Any)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_trash_tree_missing() {
        let db = setup_db().await;
        let repo = FolderRepository::new(db.pool());

        let result = repo.trash_tree(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(DriveError::NotFound(_))));
    }
}
