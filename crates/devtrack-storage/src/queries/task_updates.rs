// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task-update row operations.
//!
//! Sync state is monotonic: `synced` never goes back to false, and
//! `synced_at` is set in the same statement that flips the flag.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use devtrack_core::DevtrackError;

use crate::database::{map_tr_err, Database};
use crate::models::TaskUpdateRecord;

fn row_to_update(row: &Row<'_>) -> Result<TaskUpdateRecord, rusqlite::Error> {
    Ok(TaskUpdateRecord {
        id: row.get(0)?,
        response_id: row.get(1)?,
        timestamp: row.get(2)?,
        project: row.get(3)?,
        ticket_id: row.get(4)?,
        update_text: row.get(5)?,
        status: row.get(6)?,
        synced: row.get(7)?,
        synced_at: row.get(8)?,
        platform: row.get(9)?,
        error: row.get(10)?,
    })
}

const UPDATE_COLUMNS: &str = "id, response_id, timestamp, project, ticket_id, update_text, \
                              status, synced, synced_at, platform, error";

/// Insert a task-update row. Returns the newly assigned id.
pub async fn insert_task_update(
    db: &Database,
    record: &TaskUpdateRecord,
) -> Result<i64, DevtrackError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO task_updates (response_id, timestamp, project, ticket_id,
                                           update_text, status, synced, synced_at, platform, error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.response_id,
                    record.timestamp,
                    record.project,
                    record.ticket_id,
                    record.update_text,
                    record.status,
                    record.synced,
                    record.synced_at,
                    record.platform,
                    record.error,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Task updates not yet acknowledged by the integration, oldest first.
pub async fn get_unsynced_task_updates(
    db: &Database,
) -> Result<Vec<TaskUpdateRecord>, DevtrackError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {UPDATE_COLUMNS} FROM task_updates WHERE synced = 0 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map([], row_to_update)?;
            let mut updates = Vec::new();
            for row in rows {
                updates.push(row?);
            }
            Ok(updates)
        })
        .await
        .map_err(map_tr_err)
}

/// Mark an update as synced at the given instant.
///
/// Idempotent: the `synced = 0` guard makes a second call a no-op, so the
/// original `synced_at` is preserved.
pub async fn mark_task_update_synced(
    db: &Database,
    id: i64,
    at: DateTime<Utc>,
) -> Result<(), DevtrackError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE task_updates SET synced = 1, synced_at = ?2
                 WHERE id = ?1 AND synced = 0",
                params![id, at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_update() -> TaskUpdateRecord {
        TaskUpdateRecord {
            id: 0,
            response_id: None,
            timestamp: Utc::now(),
            project: "P".to_string(),
            ticket_id: "P-1".to_string(),
            update_text: Some("Fixed".to_string()),
            status: Some("in_progress".to_string()),
            synced: false,
            synced_at: None,
            platform: "pending".to_string(),
            error: None,
        }
    }

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_lands_unsynced_with_pending_platform() {
        let (db, _dir) = setup_db().await;

        insert_task_update(&db, &make_update()).await.unwrap();

        let unsynced = get_unsynced_task_updates(&db).await.unwrap();
        assert_eq!(unsynced.len(), 1);
        assert!(!unsynced[0].synced);
        assert!(unsynced[0].synced_at.is_none());
        assert_eq!(unsynced[0].platform, "pending");
        assert_eq!(unsynced[0].ticket_id, "P-1");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_synced_sets_flag_and_instant() {
        let (db, _dir) = setup_db().await;

        let id = insert_task_update(&db, &make_update()).await.unwrap();
        let at = Utc::now();
        mark_task_update_synced(&db, id, at).await.unwrap();

        let unsynced = get_unsynced_task_updates(&db).await.unwrap();
        assert!(unsynced.is_empty());

        let (synced, synced_at): (bool, Option<DateTime<Utc>>) = db
            .connection()
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT synced, synced_at FROM task_updates WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?)
            })
            .await
            .unwrap();
        assert!(synced);
        assert_eq!(synced_at, Some(at));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_synced_twice_keeps_first_instant() {
        let (db, _dir) = setup_db().await;

        let id = insert_task_update(&db, &make_update()).await.unwrap();
        let first = Utc::now();
        mark_task_update_synced(&db, id, first).await.unwrap();
        let later = first + chrono::Duration::seconds(90);
        mark_task_update_synced(&db, id, later).await.unwrap();

        let synced_at: Option<DateTime<Utc>> = db
            .connection()
            .call(move |conn| {
                Ok(conn.query_row(
                    "SELECT synced_at FROM task_updates WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(synced_at, Some(first), "second call must be a no-op");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unsynced_returns_oldest_first() {
        let (db, _dir) = setup_db().await;

        let first = insert_task_update(&db, &make_update()).await.unwrap();
        let second = insert_task_update(&db, &make_update()).await.unwrap();

        let unsynced = get_unsynced_task_updates(&db).await.unwrap();
        assert_eq!(unsynced.len(), 2);
        assert_eq!(unsynced[0].id, first);
        assert_eq!(unsynced[1].id, second);

        db.close().await.unwrap();
    }
}
