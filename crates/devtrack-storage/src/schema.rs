// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded SQL schema, created idempotently on open.
//!
//! `PRAGMA user_version` gates future schema revisions; the statements
//! themselves are `IF NOT EXISTS` so re-running is always safe.

use rusqlite::Connection;

/// Current schema revision.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
-- Triggers: every observed commit or timer firing, append-only.
CREATE TABLE IF NOT EXISTS triggers (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    trigger_type   TEXT NOT NULL,
    timestamp      TEXT NOT NULL,
    source         TEXT NOT NULL,
    repo_path      TEXT,
    commit_hash    TEXT,
    commit_message TEXT,
    author         TEXT,
    data           TEXT,
    processed      INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- Responses: the peer's structured reply to a trigger.
CREATE TABLE IF NOT EXISTS responses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    trigger_id  INTEGER NOT NULL,
    timestamp   TEXT NOT NULL,
    project     TEXT,
    ticket_id   TEXT,
    description TEXT,
    time_spent  TEXT,
    status      TEXT,
    raw_input   TEXT,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (trigger_id) REFERENCES triggers(id) ON DELETE CASCADE
);

-- Task updates: outbound tracker changes with an observable sync flag.
CREATE TABLE IF NOT EXISTS task_updates (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    response_id INTEGER,
    timestamp   TEXT NOT NULL,
    project     TEXT NOT NULL,
    ticket_id   TEXT NOT NULL,
    update_text TEXT,
    status      TEXT,
    synced      INTEGER NOT NULL DEFAULT 0,
    synced_at   TEXT,
    platform    TEXT,
    error       TEXT,
    created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    FOREIGN KEY (response_id) REFERENCES responses(id) ON DELETE CASCADE
);

-- Logs: structured application log entries, subject to retention.
CREATE TABLE IF NOT EXISTS logs (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp  TEXT NOT NULL,
    level      TEXT NOT NULL,
    component  TEXT NOT NULL,
    message    TEXT NOT NULL,
    data       TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

-- Config: key-value pairs with upsert semantics.
CREATE TABLE IF NOT EXISTS config (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_triggers_timestamp    ON triggers(timestamp);
CREATE INDEX IF NOT EXISTS idx_triggers_processed    ON triggers(processed);
CREATE INDEX IF NOT EXISTS idx_responses_trigger     ON responses(trigger_id);
CREATE INDEX IF NOT EXISTS idx_task_updates_response ON task_updates(response_id);
CREATE INDEX IF NOT EXISTS idx_task_updates_synced   ON task_updates(synced);
CREATE INDEX IF NOT EXISTS idx_logs_timestamp        ON logs(timestamp);
CREATE INDEX IF NOT EXISTS idx_logs_level            ON logs(level);
"#;

/// Apply the schema to a fresh or existing database.
pub fn apply(conn: &Connection) -> Result<(), rusqlite::Error> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        apply(&conn).unwrap();

        let version: i32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn all_tables_exist_after_apply() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();

        for table in ["triggers", "responses", "task_updates", "logs", "config"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "table {table} should exist");
        }
    }
}
