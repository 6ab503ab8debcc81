// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite event store for the DevTrack daemon.
//!
//! A single-file database under the user's profile directory records every
//! trigger, user response, outbound task update (with sync state), and
//! structured log entry. Writes are serialized through tokio-rusqlite's
//! background thread; readers run concurrently under WAL.

pub mod database;
pub mod models;
pub mod queries;
pub mod schema;
pub mod store;

pub use models::{LogRecord, ResponseRecord, StoreStats, TaskUpdateRecord, TriggerRecord};
pub use queries::maintenance::CleanupReport;
pub use store::EventStore;
