// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value config operations with upsert semantics.

use rusqlite::params;

use devtrack_core::DevtrackError;

use crate::database::{map_tr_err, Database};

/// Fetch a config value, or `None` if the key is absent.
pub async fn get_config(db: &Database, key: &str) -> Result<Option<String>, DevtrackError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare("SELECT value FROM config WHERE key = ?1")?;
            let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
            Ok(rows.next().transpose()?)
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace a config value, bumping `updated_at`.
pub async fn set_config(db: &Database, key: &str, value: &str) -> Result<(), DevtrackError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO config (key, value, updated_at)
                 VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
                 ON CONFLICT(key) DO UPDATE
                 SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value],
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

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();

        assert!(get_config(&db, "scheduler.paused").await.unwrap().is_none());

        set_config(&db, "scheduler.paused", "true").await.unwrap();
        assert_eq!(
            get_config(&db, "scheduler.paused").await.unwrap().as_deref(),
            Some("true")
        );

        // Upsert replaces.
        set_config(&db, "scheduler.paused", "false").await.unwrap();
        assert_eq!(
            get_config(&db, "scheduler.paused").await.unwrap().as_deref(),
            Some("false")
        );

        db.close().await.unwrap();
    }
}
