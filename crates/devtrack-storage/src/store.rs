// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event-store facade used by the rest of the daemon.
//!
//! Wraps a [`Database`] handle and delegates to the typed query modules.
//! Readers may be concurrent (WAL); all writes funnel through the single
//! background writer thread.

use std::path::Path;

use chrono::{DateTime, Utc};

use devtrack_core::DevtrackError;

use crate::database::Database;
use crate::models::{LogRecord, ResponseRecord, StoreStats, TaskUpdateRecord, TriggerRecord};
use crate::queries;
use crate::queries::maintenance::CleanupReport;

/// Durable store for triggers, responses, task updates, logs, and config.
pub struct EventStore {
    db: Database,
}

impl EventStore {
    /// Open the store at `path`, creating file and schema as needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DevtrackError> {
        Ok(Self {
            db: Database::open(path).await?,
        })
    }

    /// Checkpoint and release the store.
    pub async fn close(&self) -> Result<(), DevtrackError> {
        self.db.close().await
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    // --- Triggers ---

    pub async fn insert_trigger(&self, record: &TriggerRecord) -> Result<i64, DevtrackError> {
        queries::triggers::insert_trigger(&self.db, record).await
    }

    pub async fn get_trigger_by_id(
        &self,
        id: i64,
    ) -> Result<Option<TriggerRecord>, DevtrackError> {
        queries::triggers::get_trigger_by_id(&self.db, id).await
    }

    pub async fn get_recent_triggers(
        &self,
        limit: i64,
    ) -> Result<Vec<TriggerRecord>, DevtrackError> {
        queries::triggers::get_recent_triggers(&self.db, limit).await
    }

    pub async fn mark_trigger_processed(&self, id: i64) -> Result<(), DevtrackError> {
        queries::triggers::mark_trigger_processed(&self.db, id).await
    }

    // --- Responses ---

    pub async fn insert_response(&self, record: &ResponseRecord) -> Result<i64, DevtrackError> {
        queries::responses::insert_response(&self.db, record).await
    }

    pub async fn get_responses_for_trigger(
        &self,
        trigger_id: i64,
    ) -> Result<Vec<ResponseRecord>, DevtrackError> {
        queries::responses::get_responses_for_trigger(&self.db, trigger_id).await
    }

    // --- Task updates ---

    pub async fn insert_task_update(
        &self,
        record: &TaskUpdateRecord,
    ) -> Result<i64, DevtrackError> {
        queries::task_updates::insert_task_update(&self.db, record).await
    }

    pub async fn get_unsynced_task_updates(&self) -> Result<Vec<TaskUpdateRecord>, DevtrackError> {
        queries::task_updates::get_unsynced_task_updates(&self.db).await
    }

    pub async fn mark_task_update_synced(
        &self,
        id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), DevtrackError> {
        queries::task_updates::mark_task_update_synced(&self.db, id, at).await
    }

    // --- Logs ---

    pub async fn insert_log(&self, record: &LogRecord) -> Result<(), DevtrackError> {
        queries::logs::insert_log(&self.db, record).await
    }

    pub async fn recent_logs(
        &self,
        limit: i64,
        level: Option<String>,
    ) -> Result<Vec<LogRecord>, DevtrackError> {
        queries::logs::recent_logs(&self.db, limit, level).await
    }

    // --- Config ---

    pub async fn get_config(&self, key: &str) -> Result<Option<String>, DevtrackError> {
        queries::config::get_config(&self.db, key).await
    }

    pub async fn set_config(&self, key: &str, value: &str) -> Result<(), DevtrackError> {
        queries::config::set_config(&self.db, key, value).await
    }

    // --- Maintenance ---

    pub async fn clean_old_records(
        &self,
        retention_days: u32,
    ) -> Result<CleanupReport, DevtrackError> {
        queries::maintenance::clean_old_records(&self.db, retention_days).await
    }

    pub async fn stats(&self) -> Result<StoreStats, DevtrackError> {
        queries::maintenance::stats(&self.db).await
    }
}
