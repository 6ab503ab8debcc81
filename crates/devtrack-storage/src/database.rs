// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread: `Database` IS the single writer. Query modules accept `&Database`
//! and go through `connection().call()`. Do NOT create additional write
//! connections to the same file.

use std::path::{Path, PathBuf};

use tokio_rusqlite::Connection;
use tracing::debug;

use devtrack_core::DevtrackError;

use crate::schema;

/// SQLite busy timeout. Writes that still fail after this surface `StoreBusy`.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Handle to the single-file event-store database.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open (creating if necessary) the database at `path`, configure
    /// PRAGMAs, and apply the schema idempotently.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DevtrackError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DevtrackError::StoreUnavailable {
                source: Box::new(e),
            })?;
        }

        let conn = Connection::open(&path)
            .await
            .map_err(|e| DevtrackError::StoreUnavailable {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            schema::apply(conn)?;
            Ok(())
        })
        .await
        .map_err(|e| DevtrackError::StoreUnavailable {
            source: Box::new(e),
        })?;

        debug!(path = %path.display(), "event store opened");
        Ok(Self { conn, path })
    }

    /// The serialized write connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), DevtrackError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the store's error vocabulary.
///
/// `SQLITE_BUSY`/`SQLITE_LOCKED` past the busy timeout become `StoreBusy`,
/// which callers log and swallow without re-firing the trigger; everything
/// else is `StoreUnavailable`.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> DevtrackError {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(ffi, ref msg)) = err {
        if matches!(
            ffi.code,
            rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
        ) {
            return DevtrackError::StoreBusy {
                detail: msg.clone().unwrap_or_else(|| "database is locked".into()),
            };
        }
    }
    DevtrackError::StoreUnavailable {
        source: Box::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested/devtrack.db");
        let db = Database::open(&db_path).await.unwrap();
        assert!(db_path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_is_idempotent_across_reopens() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("devtrack.db");

        let db = Database::open(&db_path).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Second open re-applies the schema without error.
        let db = Database::open(&db_path).await.unwrap();
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn wal_mode_is_active() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("wal.db")).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| {
                Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?)
            })
            .await
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn busy_error_maps_to_store_busy() {
        let ffi = rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY);
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(ffi, None));
        assert!(matches!(map_tr_err(err), DevtrackError::StoreBusy { .. }));
    }
}
