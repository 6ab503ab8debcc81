// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured log row operations.
//!
//! `insert_log` is a single short statement so it never holds the writer
//! for more than a bounded moment.

use rusqlite::{params, Row};

use devtrack_core::DevtrackError;

use crate::database::{map_tr_err, Database};
use crate::models::LogRecord;

fn row_to_log(row: &Row<'_>) -> Result<LogRecord, rusqlite::Error> {
    Ok(LogRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        level: row.get(2)?,
        component: row.get(3)?,
        message: row.get(4)?,
        data: row.get(5)?,
    })
}

/// Insert a log row.
pub async fn insert_log(db: &Database, record: &LogRecord) -> Result<(), DevtrackError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO logs (timestamp, level, component, message, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.timestamp,
                    record.level,
                    record.component,
                    record.message,
                    record.data,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent log rows, newest first, optionally filtered by level.
pub async fn recent_logs(
    db: &Database,
    limit: i64,
    level: Option<String>,
) -> Result<Vec<LogRecord>, DevtrackError> {
    db.connection()
        .call(move |conn| {
            let mut logs = Vec::new();
            match level {
                Some(level) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, timestamp, level, component, message, data
                         FROM logs WHERE level = ?1 ORDER BY id DESC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(params![level, limit], row_to_log)?;
                    for row in rows {
                        logs.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, timestamp, level, component, message, data
                         FROM logs ORDER BY id DESC LIMIT ?1",
                    )?;
                    let rows = stmt.query_map(params![limit], row_to_log)?;
                    for row in rows {
                        logs.push(row?);
                    }
                }
            }
            Ok(logs)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let (db, _dir) = setup_db().await;

        insert_log(&db, &LogRecord::now("info", "scheduler", "started"))
            .await
            .unwrap();
        insert_log(&db, &LogRecord::now("error", "ipc", "peer vanished"))
            .await
            .unwrap();

        let all = recent_logs(&db, 10, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "peer vanished");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn level_filter_applies() {
        let (db, _dir) = setup_db().await;

        insert_log(&db, &LogRecord::now("info", "scheduler", "tick"))
            .await
            .unwrap();
        insert_log(&db, &LogRecord::now("error", "ipc", "boom"))
            .await
            .unwrap();

        let errors = recent_logs(&db, 10, Some("error".to_string())).await.unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].component, "ipc");

        db.close().await.unwrap();
    }
}
