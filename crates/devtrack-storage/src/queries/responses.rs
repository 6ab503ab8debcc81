// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Response row operations.

use rusqlite::{params, Row};

use devtrack_core::DevtrackError;

use crate::database::{map_tr_err, Database};
use crate::models::ResponseRecord;

fn row_to_response(row: &Row<'_>) -> Result<ResponseRecord, rusqlite::Error> {
    Ok(ResponseRecord {
        id: row.get(0)?,
        trigger_id: row.get(1)?,
        timestamp: row.get(2)?,
        project: row.get(3)?,
        ticket_id: row.get(4)?,
        description: row.get(5)?,
        time_spent: row.get(6)?,
        status: row.get(7)?,
        raw_input: row.get(8)?,
    })
}

/// Insert a response row. Returns the newly assigned id.
pub async fn insert_response(db: &Database, record: &ResponseRecord) -> Result<i64, DevtrackError> {
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO responses (trigger_id, timestamp, project, ticket_id, description,
                                        time_spent, status, raw_input)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.trigger_id,
                    record.timestamp,
                    record.project,
                    record.ticket_id,
                    record.description,
                    record.time_spent,
                    record.status,
                    record.raw_input,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Responses recorded for a trigger, oldest first.
pub async fn get_responses_for_trigger(
    db: &Database,
    trigger_id: i64,
) -> Result<Vec<ResponseRecord>, DevtrackError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, trigger_id, timestamp, project, ticket_id, description,
                        time_spent, status, raw_input
                 FROM responses WHERE trigger_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![trigger_id], row_to_response)?;
            let mut responses = Vec::new();
            for row in rows {
                responses.push(row?);
            }
            Ok(responses)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TriggerRecord;
    use crate::queries::triggers::insert_trigger;
    use chrono::Utc;
    use devtrack_core::TriggerKind;
    use tempfile::tempdir;

    async fn setup_with_trigger() -> (Database, tempfile::TempDir, i64) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).await.unwrap();
        let trigger_id = insert_trigger(
            &db,
            &TriggerRecord {
                id: 0,
                trigger_type: TriggerKind::Timer,
                timestamp: Utc::now(),
                source: "scheduler".to_string(),
                repo_path: None,
                commit_hash: None,
                commit_message: None,
                author: None,
                data: None,
                processed: false,
            },
        )
        .await
        .unwrap();
        (db, dir, trigger_id)
    }

    #[tokio::test]
    async fn insert_and_fetch_by_trigger() {
        let (db, _dir, trigger_id) = setup_with_trigger().await;

        let record = ResponseRecord {
            id: 0,
            trigger_id,
            timestamp: Utc::now(),
            project: Some("DevTrack".to_string()),
            ticket_id: Some("DT-7".to_string()),
            description: Some("worked on the scheduler".to_string()),
            time_spent: Some("2h".to_string()),
            status: Some("in_progress".to_string()),
            raw_input: "spent 2h on DT-7 scheduler work".to_string(),
        };
        let id = insert_response(&db, &record).await.unwrap();
        assert!(id > 0);

        let responses = get_responses_for_trigger(&db, trigger_id).await.unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].ticket_id.as_deref(), Some("DT-7"));
        assert_eq!(responses[0].raw_input, record.raw_input);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unrelated_trigger_has_no_responses() {
        let (db, _dir, trigger_id) = setup_with_trigger().await;
        let responses = get_responses_for_trigger(&db, trigger_id + 1).await.unwrap();
        assert!(responses.is_empty());
        db.close().await.unwrap();
    }
}
