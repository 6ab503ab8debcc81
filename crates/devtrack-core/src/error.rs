// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the DevTrack daemon.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across all DevTrack components.
///
/// Startup-time errors (`Config`, `StoreUnavailable`, `BindFailed`,
/// `AlreadyRunning`) are fatal; per-event errors (`StoreBusy`,
/// `PeerDisconnected`, `MalformedMessage`) are logged at the call site and
/// swallowed so the daemon keeps running.
#[derive(Debug, Error)]
pub enum DevtrackError {
    /// Configuration errors (unparsable YAML, invalid values, bad env overrides).
    #[error("configuration error: {0}")]
    Config(String),

    /// The given path does not contain a `.git` directory.
    #[error("not a git repository: {}", path.display())]
    NotARepository { path: PathBuf },

    /// The event store could not be opened or its schema could not be created.
    #[error("event store unavailable: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A write hit sustained contention; the row was dropped.
    #[error("event store busy: {detail}")]
    StoreBusy { detail: String },

    /// The filesystem watcher could not be created or attached.
    #[error("watcher unavailable: {source}")]
    WatcherUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The repository exists but HEAD or its objects could not be read.
    #[error("repository unreadable at {}: {source}", path.display())]
    RepositoryUnreadable {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A running watcher hit a permanent error and stopped.
    #[error("watcher failed for {}: {message}", repo.display())]
    WatcherFailed { repo: PathBuf, message: String },

    /// The IPC endpoint could not be bound (address in use, permissions).
    #[error("failed to bind IPC endpoint {}: {source}", path.display())]
    BindFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An IPC peer went away mid-conversation. Observed and logged; not fatal.
    #[error("IPC peer disconnected: {client_id}")]
    PeerDisconnected { client_id: String },

    /// An inbound IPC frame was not a valid message. Discarded.
    #[error("malformed IPC message: {detail}")]
    MalformedMessage { detail: String },

    /// Another daemon instance holds a live PID file.
    #[error("daemon already running (PID: {pid})")]
    AlreadyRunning { pid: i32 },

    /// A control command needs a running daemon and there is none.
    #[error("daemon is not running")]
    NotRunning,

    /// The scheduler is not available to serve a control command.
    #[error("scheduler not available")]
    SchedulerUnavailable,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_user_facing() {
        let err = DevtrackError::AlreadyRunning { pid: 4242 };
        assert_eq!(err.to_string(), "daemon already running (PID: 4242)");

        let err = DevtrackError::NotARepository {
            path: PathBuf::from("/tmp/not-a-repo"),
        };
        assert!(err.to_string().contains("/tmp/not-a-repo"));

        let err = DevtrackError::NotRunning;
        assert_eq!(err.to_string(), "daemon is not running");
    }

    #[test]
    fn store_unavailable_carries_source() {
        let io = std::io::Error::other("disk on fire");
        let err = DevtrackError::StoreUnavailable {
            source: Box::new(io),
        };
        assert!(err.to_string().contains("disk on fire"));
    }
}
