// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trigger row operations.

use std::str::FromStr;

use rusqlite::{params, Row};

use devtrack_core::{DevtrackError, TriggerKind};

use crate::database::{map_tr_err, Database};
use crate::models::TriggerRecord;

fn row_to_trigger(row: &Row<'_>) -> Result<TriggerRecord, rusqlite::Error> {
    let kind: String = row.get(1)?;
    Ok(TriggerRecord {
        id: row.get(0)?,
        trigger_type: TriggerKind::from_str(&kind).unwrap_or(TriggerKind::Manual),
        timestamp: row.get(2)?,
        source: row.get(3)?,
        repo_path: row.get(4)?,
        commit_hash: row.get(5)?,
        commit_message: row.get(6)?,
        author: row.get(7)?,
        data: row.get(8)?,
        processed: row.get(9)?,
    })
}

const TRIGGER_COLUMNS: &str = "id, trigger_type, timestamp, source, repo_path, commit_hash, \
                               commit_message, author, data, processed";

/// Insert a trigger row. Returns the newly assigned monotonic id.
pub async fn insert_trigger(db: &Database, record: &TriggerRecord) -> Result<i64, DevtrackError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO triggers (trigger_type, timestamp, source, repo_path, commit_hash,
                                       commit_message, author, data, processed)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.trigger_type.to_string(),
                    record.timestamp,
                    record.source,
                    record.repo_path,
                    record.commit_hash,
                    record.commit_message,
                    record.author,
                    record.data,
                    record.processed,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single trigger by id.
pub async fn get_trigger_by_id(
    db: &Database,
    id: i64,
) -> Result<Option<TriggerRecord>, DevtrackError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRIGGER_COLUMNS} FROM triggers WHERE id = ?1"
            ))?;
            let mut rows = stmt.query_map(params![id], row_to_trigger)?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(map_tr_err)
}

/// The most recent triggers, newest first.
pub async fn get_recent_triggers(
    db: &Database,
    limit: i64,
) -> Result<Vec<TriggerRecord>, DevtrackError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TRIGGER_COLUMNS} FROM triggers ORDER BY id DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], row_to_trigger)?;
            let mut triggers = Vec::new();
            for row in rows {
                triggers.push(row?);
            }
            Ok(triggers)
        })
        .await
        .map_err(map_tr_err)
}

/// Flip `processed` on. Called once when the downstream response lands.
pub async fn mark_trigger_processed(db: &Database, id: i64) -> Result<(), DevtrackError> {
    db.connection()
        .call(move |conn| {
            conn.execute("UPDATE triggers SET processed = 1 WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
