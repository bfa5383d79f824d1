//! SQLite library database
//!
//! Tracks installed libraries (one row per `machine_name` and `major.minor`
//! line) and the admin restriction flags.

use std::path::Path;

use hubsync_core::host::{HostError, LibraryId};
use hubsync_schema::{LibraryVersion, library_key};
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use crate::db_path;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Library not found: {0}")]
    LibraryNotFound(String),
}

impl From<DbError> for HostError {
    fn from(e: DbError) -> Self {
        HostError::Backend(e.to_string())
    }
}

/// Installed library record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRecord {
    pub id: LibraryId,
    pub machine_name: String,
    pub version: LibraryVersion,
    pub title: Option<String>,
    pub tutorial_url: Option<String>,
    /// Library folder, when the files were installed by hubsync.
    pub path: Option<String>,
    pub installed_at: i64,
}

impl LibraryRecord {
    /// Registry key `{machine_name}-{major}.{minor}`.
    pub fn key(&self) -> String {
        library_key(&self.machine_name, self.version.major, self.version.minor)
    }
}

/// What gets written when a library is installed or registered.
#[derive(Debug, Clone, Copy)]
pub struct NewLibrary<'a> {
    pub machine_name: &'a str,
    pub version: LibraryVersion,
    pub title: Option<&'a str>,
    pub path: Option<&'a str>,
}

const LIBRARY_COLUMNS: &str =
    "id, machine_name, major, minor, patch, title, tutorial_url, path, installed_at";

fn library_from_row(row: &Row<'_>) -> rusqlite::Result<LibraryRecord> {
    Ok(LibraryRecord {
        id: LibraryId(row.get(0)?),
        machine_name: row.get(1)?,
        version: LibraryVersion::new(row.get(2)?, row.get(3)?, row.get(4)?),
        title: row.get(5)?,
        tutorial_url: row.get(6)?,
        path: row.get(7)?,
        installed_at: row.get(8)?,
    })
}

/// Library database
#[derive(Debug)]
pub struct LibraryDb {
    conn: Connection,
}

impl LibraryDb {
    /// Open or create the library database
    pub fn open() -> Result<Self, DbError> {
        let path = db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.display().to_string(),
                source,
            })?;
        }
        Self::open_at(&path)
    }

    /// Open database at a specific path (for testing)
    pub fn open_at(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS libraries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                machine_name TEXT NOT NULL,
                major INTEGER NOT NULL,
                minor INTEGER NOT NULL,
                patch INTEGER NOT NULL,
                title TEXT,
                tutorial_url TEXT,
                path TEXT,
                installed_at INTEGER NOT NULL,
                UNIQUE (machine_name, major, minor)
            );

            CREATE TABLE IF NOT EXISTS restrictions (
                machine_name TEXT NOT NULL,
                major INTEGER NOT NULL,
                minor INTEGER NOT NULL,
                PRIMARY KEY (machine_name, major, minor)
            );

            CREATE INDEX IF NOT EXISTS idx_libraries_name ON libraries(machine_name);
            ",
        )?;
        Ok(())
    }

    /// Insert a library line, or bump the patch level of an existing one.
    pub fn upsert_library(&self, lib: &NewLibrary<'_>) -> Result<LibraryId, DbError> {
        let now = chrono::Utc::now().timestamp();
        let id = self.conn.query_row(
            "INSERT INTO libraries (machine_name, major, minor, patch, title, path, installed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (machine_name, major, minor) DO UPDATE SET
                patch = excluded.patch,
                title = COALESCE(excluded.title, libraries.title),
                path = COALESCE(excluded.path, libraries.path),
                installed_at = excluded.installed_at
             RETURNING id",
            params![
                lib.machine_name,
                lib.version.major,
                lib.version.minor,
                lib.version.patch,
                lib.title,
                lib.path,
                now
            ],
            |row| row.get(0),
        )?;
        Ok(LibraryId(id))
    }

    /// The newest installed line of `machine_name`.
    pub fn latest_library(&self, machine_name: &str) -> Result<Option<LibraryRecord>, DbError> {
        let sql = format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries WHERE machine_name = ?1
             ORDER BY major DESC, minor DESC, patch DESC LIMIT 1"
        );
        self.conn
            .query_row(&sql, params![machine_name], library_from_row)
            .optional()
            .map_err(Into::into)
    }

    pub fn get_library(&self, id: LibraryId) -> Result<Option<LibraryRecord>, DbError> {
        let sql = format!("SELECT {LIBRARY_COLUMNS} FROM libraries WHERE id = ?1");
        self.conn
            .query_row(&sql, params![id.0], library_from_row)
            .optional()
            .map_err(Into::into)
    }

    /// Resolve a `{machine_name}-{major}.{minor}` key.
    pub fn find_by_key(&self, key: &str) -> Result<Option<LibraryId>, DbError> {
        self.conn
            .query_row(
                "SELECT id FROM libraries
                 WHERE machine_name || '-' || major || '.' || minor = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map(|id| id.map(LibraryId))
            .map_err(Into::into)
    }

    /// List all installed libraries
    pub fn list_libraries(&self) -> Result<Vec<LibraryRecord>, DbError> {
        let sql = format!(
            "SELECT {LIBRARY_COLUMNS} FROM libraries ORDER BY machine_name, major, minor"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let libraries = stmt.query_map([], library_from_row)?;
        libraries.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn set_tutorial_url(&self, id: LibraryId, url: &str) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE libraries SET tutorial_url = ?1 WHERE id = ?2",
            params![url, id.0],
        )?;
        if updated == 0 {
            return Err(DbError::LibraryNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Flag one `major.minor` line of a library as restricted.
    pub fn restrict(&self, machine_name: &str, major: u32, minor: u32) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO restrictions (machine_name, major, minor) VALUES (?1, ?2, ?3)",
            params![machine_name, major, minor],
        )?;
        Ok(())
    }

    /// Clear a restriction. Returns whether one existed.
    pub fn unrestrict(&self, machine_name: &str, major: u32, minor: u32) -> Result<bool, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM restrictions WHERE machine_name = ?1 AND major = ?2 AND minor = ?3",
            params![machine_name, major, minor],
        )?;
        Ok(deleted > 0)
    }

    pub fn is_restricted(&self, machine_name: &str, major: u32, minor: u32) -> Result<bool, DbError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM restrictions WHERE machine_name = ?1 AND major = ?2 AND minor = ?3",
                params![machine_name, major, minor],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// All restricted `(machine_name, major, minor)` lines.
    pub fn list_restrictions(&self) -> Result<Vec<(String, u32, u32)>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT machine_name, major, minor FROM restrictions ORDER BY machine_name, major, minor",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
