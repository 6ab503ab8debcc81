// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the event-store tables.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use devtrack_core::TriggerKind;

/// A trigger event row. Append-only; `processed` flips once when the
/// downstream response is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRecord {
    /// Monotonic rowid; 0 before insert.
    pub id: i64,
    pub trigger_type: TriggerKind,
    pub timestamp: DateTime<Utc>,
    /// Component that produced the event ("git", "scheduler", "operator").
    pub source: String,
    pub repo_path: Option<String>,
    pub commit_hash: Option<String>,
    pub commit_message: Option<String>,
    pub author: Option<String>,
    /// Opaque JSON blob with kind-specific detail.
    pub data: Option<String>,
    pub processed: bool,
}

/// A user response row, inserted once per reply to a trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub trigger_id: i64,
    pub timestamp: DateTime<Utc>,
    pub project: Option<String>,
    pub ticket_id: Option<String>,
    pub description: Option<String>,
    pub time_spent: Option<String>,
    pub status: Option<String>,
    /// The original unparsed reply text.
    pub raw_input: String,
}

/// An outbound task-update row. `synced` flips true exactly once, with
/// `synced_at` set in the same statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdateRecord {
    pub id: i64,
    pub response_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub project: String,
    pub ticket_id: String,
    pub update_text: Option<String>,
    pub status: Option<String>,
    pub synced: bool,
    pub synced_at: Option<DateTime<Utc>>,
    /// Target platform tag ("azure_devops", "github", "jira", or "pending"
    /// until the integration claims it).
    pub platform: String,
    pub error: Option<String>,
}

/// A structured log row, subject to retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    /// One of "debug", "info", "warning", "error".
    pub level: String,
    pub component: String,
    pub message: String,
    pub data: Option<String>,
}

impl LogRecord {
    /// Convenience constructor for the common insert path.
    pub fn now(level: &str, component: &str, message: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp: Utc::now(),
            level: level.to_string(),
            component: component.to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// Table counts reported by `EventStore::stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub triggers: i64,
    pub responses: i64,
    pub task_updates: i64,
    pub unsynced_updates: i64,
    pub logs: i64,
    pub database_path: PathBuf,
}
