//! Database schema and migrations for filedrive.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Catalog tables
    r#"
CREATE TABLE folders (
    id          BLOB PRIMARY KEY,        -- UUID v4
    name        TEXT NOT NULL CHECK (length(name) > 0),
    parent_id   BLOB REFERENCES folders(id),
    is_starred  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT                     -- NULL while live
);

CREATE INDEX idx_folders_parent ON folders(parent_id);
CREATE INDEX idx_folders_deleted ON folders(deleted_at);

CREATE TABLE files (
    id          BLOB PRIMARY KEY,        -- UUID v4
    name        TEXT NOT NULL CHECK (length(name) > 0),
    size        INTEGER NOT NULL CHECK (size >= 0),
    storage_key TEXT NOT NULL UNIQUE CHECK (length(storage_key) > 0),
    parent_id   BLOB REFERENCES folders(id),
    is_starred  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

CREATE INDEX idx_files_parent ON files(parent_id);
CREATE INDEX idx_files_deleted ON files(deleted_at);
CREATE INDEX idx_files_created ON files(created_at);
"#,
    // v2: Starred lookups
    r#"
CREATE INDEX idx_files_starred ON files(is_starred) WHERE is_starred = 1;
CREATE INDEX idx_folders_starred ON folders(is_starred) WHERE is_starred = 1;
"#,
];
