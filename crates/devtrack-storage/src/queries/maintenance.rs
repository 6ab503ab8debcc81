// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention and statistics.

use chrono::{Duration, Utc};
use rusqlite::params;

use devtrack_core::DevtrackError;

use crate::database::{map_tr_err, Database};
use crate::models::StoreStats;

/// Rows removed by a retention pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupReport {
    pub logs_deleted: usize,
    pub triggers_deleted: usize,
}

/// Remove old rows in one transaction: logs older than the cutoff, and
/// processed triggers older than the cutoff. Unprocessed triggers are kept
/// indefinitely. Responses and task updates of a removed trigger go with it
/// (`ON DELETE CASCADE`).
pub async fn clean_old_records(
    db: &Database,
    retention_days: u32,
) -> Result<CleanupReport, DevtrackError> {
    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let logs_deleted =
                tx.execute("DELETE FROM logs WHERE timestamp < ?1", params![cutoff])?;
            let triggers_deleted = tx.execute(
                "DELETE FROM triggers WHERE timestamp < ?1 AND processed = 1",
                params![cutoff],
            )?;
            tx.commit()?;
            Ok(CleanupReport {
                logs_deleted,
                triggers_deleted,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Table counts plus the store's file path.
pub async fn stats(db: &Database) -> Result<StoreStats, DevtrackError> {
    let path = db.path().to_path_buf();
    db.connection()
        .call(move |conn| {
            let count = |sql: &str| -> Result<i64, rusqlite::Error> {
                conn.query_row(sql, [], |row| row.get(0))
            };
            Ok(StoreStats {
                triggers: count("SELECT COUNT(*) FROM triggers")?,
                responses: count("SELECT COUNT(*) FROM responses")?,
                task_updates: count("SELECT COUNT(*) FROM task_updates")?,
                unsynced_updates: count("SELECT COUNT(*) FROM task_updates WHERE synced = 0")?,
                logs: count("SELECT COUNT(*) FROM logs")?,
                database_path: path,
            })
        })
        .await
        .map_err(map_tr_err)
}
