//! SQLite-backed catalog store.
//!
//! `SqliteStore` is the storage collaborator the query engine compiles
//! against: it owns the `items` / `tags` / `tag_groups` / `item_tags` schema,
//! serves the read-only snapshot the validator resolves tags from, and
//! executes compiled filters. The engine itself never opens a connection.
//!
//! The write surface (`insert_item`, `insert_tag`, ...) exists for the host
//! application's change tracker and for test fixtures; queries are strictly
//! read-only.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::Connection;
use thiserror::Error;

use tagview_model_rs::{file_name_from_path, Item, Tag, TagGroup, TagSnapshot};

use crate::query::{SqlFilter, SqlValue};

/// Default catalog database filename.
const CATALOG_FILENAME: &str = "catalog.db";

/// Application name (for XDG paths).
const APPLICATION: &str = "tagview";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id          INTEGER PRIMARY KEY,
    path        TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    is_directory INTEGER NOT NULL DEFAULT 0,
    size        INTEGER,
    modified_at INTEGER NOT NULL,
    created_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS tag_groups (
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tags (
    id       INTEGER PRIMARY KEY,
    group_id INTEGER NOT NULL REFERENCES tag_groups(id),
    value    TEXT NOT NULL,
    UNIQUE (group_id, value)
);

CREATE TABLE IF NOT EXISTS item_tags (
    item_id INTEGER NOT NULL REFERENCES items(id),
    tag_id  INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (item_id, tag_id)
);

CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);
CREATE INDEX IF NOT EXISTS idx_item_tags_tag ON item_tags(tag_id);
CREATE INDEX IF NOT EXISTS idx_tags_value ON tags(value);
"#;

/// Errors that can occur in the catalog store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to determine the XDG data directory.
    #[error("failed to determine data directory: no valid home directory found")]
    NoDataDir,

    /// I/O error creating the database's parent directory.
    #[error("failed to create data directory '{path}': {source}")]
    CreateDir {
        /// The directory path that failed to create.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to open the database file.
    #[error("failed to open catalog '{path}': {source}")]
    Open {
        /// The database path.
        path: PathBuf,
        /// The underlying SQLite error.
        #[source]
        source: rusqlite::Error,
    },

    /// A SQL statement failed.
    #[error("catalog query failed: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed catalog of items, tags, and their associations.
///
/// # Concurrency
///
/// `SqliteStore` is [`Send`] but not [`Sync`]: the underlying connection
/// must not be shared across threads without external synchronization. Wrap
/// the store in a `Mutex` for concurrent access (the search service does
/// this internally):
///
/// ```no_run
/// use std::sync::{Arc, Mutex};
/// use tagview_query_rs::store::SqliteStore;
///
/// let store = Arc::new(Mutex::new(SqliteStore::open_in_memory()?));
/// # Ok::<(), tagview_query_rs::store::StoreError>(())
/// ```
///
/// Queries never take a write lock on the database; concurrent readers only
/// contend on the connection itself.
///
/// # Example
///
/// ```
/// use tagview_query_rs::store::SqliteStore;
///
/// let store = SqliteStore::open_in_memory().unwrap();
/// let group = store.insert_group("events").unwrap();
/// let tag = store.insert_tag(group, "vacation").unwrap();
/// # let _ = tag;
/// ```
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the catalog at the given path.
    ///
    /// Creates the parent directory if it doesn't exist and applies the
    /// schema idempotently.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::init(conn)
    }

    /// Opens an in-memory catalog, for tests and fixtures.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source: e,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Returns the default XDG data path for the catalog.
    ///
    /// On Unix: `~/.local/share/tagview/catalog.db`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoDataDir`] if the home directory cannot be
    /// determined.
    pub fn default_path() -> StoreResult<PathBuf> {
        let project_dirs =
            ProjectDirs::from("", "", APPLICATION).ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().join(CATALOG_FILENAME))
    }

    // =========================================================================
    // Write surface (host application and fixtures)
    // =========================================================================

    /// Inserts a tag group, returning its id.
    pub fn insert_group(&self, name: &str) -> StoreResult<i64> {
        self.conn
            .execute("INSERT INTO tag_groups (name) VALUES (?)", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts a tag into a group, returning its id.
    pub fn insert_tag(&self, group_id: i64, value: &str) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO tags (group_id, value) VALUES (?, ?)",
            rusqlite::params![group_id, value],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts an item, returning its id. The `name` column is derived from
    /// the path with the same rule [`Item::file_name`] uses.
    pub fn insert_item(
        &self,
        path: &str,
        is_directory: bool,
        size: Option<i64>,
        modified_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> StoreResult<i64> {
        self.conn.execute(
            "INSERT INTO items (path, name, is_directory, size, modified_at, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                path,
                file_name_from_path(path),
                is_directory,
                size,
                modified_at.timestamp(),
                created_at.timestamp(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Associates a tag with an item. Idempotent.
    pub fn tag_item(&self, item_id: i64, tag_id: i64) -> StoreResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO item_tags (item_id, tag_id) VALUES (?, ?)",
            rusqlite::params![item_id, tag_id],
        )?;
        Ok(())
    }

    // =========================================================================
    // Read surface (consumed by the engine)
    // =========================================================================

    /// Captures a read-only snapshot of the tag dataset.
    pub fn tag_snapshot(&self) -> StoreResult<TagSnapshot> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, group_id, value FROM tags ORDER BY id")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    group_id: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tag_groups ORDER BY id")?;
        let groups = stmt
            .query_map([], |row| {
                Ok(TagGroup {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(TagSnapshot::new(tags, groups))
    }

    /// Executes a compiled filter and returns the matching items, unordered.
    ///
    /// Ordering is the result assembler's job.
    pub fn items_matching(&self, filter: &SqlFilter) -> StoreResult<Vec<Item>> {
        let sql = format!(
            "SELECT i.id, i.path, i.is_directory, i.size, i.modified_at, i.created_at \
             FROM items i WHERE {}",
            filter.where_clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(
                rusqlite::params_from_iter(filter.params.iter().map(bind_value)),
                row_to_item,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Total number of items in the catalog.
    pub fn item_count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn bind_value(value: &SqlValue) -> rusqlite::types::Value {
    match value {
        SqlValue::Int(i) => rusqlite::types::Value::Integer(*i),
        SqlValue::Text(s) => rusqlite::types::Value::Text(s.clone()),
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        path: row.get(1)?,
        is_directory: row.get(2)?,
        size: row.get(3)?,
        modified_at: timestamp_column(row, 4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

fn timestamp_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<DateTime<Utc>> {
    let seconds: i64 = row.get(index)?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(index, seconds)
    })
}
