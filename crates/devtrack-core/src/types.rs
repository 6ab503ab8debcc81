// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trigger and commit domain types shared across the DevTrack workspace.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The kind of observable moment that caused the system to notify its peer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Commit,
    Timer,
    Manual,
}

/// Metadata extracted from a newly observed Git commit.
///
/// `hash` is the full 40-character hex id; `message` is trimmed of
/// surrounding whitespace. `files` lists changed paths (names only),
/// diffed against the first parent, or the whole tree for a root commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub files: Vec<String>,
    /// Branch name from the HEAD reference, if HEAD is not detached.
    pub branch: Option<String>,
}

/// Payload of a scheduler firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerTick {
    /// Running count of firings since the daemon started.
    pub count: u64,
    /// Effective interval at the time of the firing.
    pub interval_minutes: u32,
}

/// A unified trigger event, fanned into the integrated monitor from either
/// the Git watcher or the scheduler.
#[derive(Debug, Clone)]
pub enum TriggerEvent {
    Commit { repo_path: PathBuf, info: CommitInfo },
    Timer { at: DateTime<Utc>, tick: TimerTick },
}

impl TriggerEvent {
    /// The kind tag persisted into the event store's `trigger_type` column.
    pub fn kind(&self) -> TriggerKind {
        match self {
            TriggerEvent::Commit { .. } => TriggerKind::Commit,
            TriggerEvent::Timer { .. } => TriggerKind::Timer,
        }
    }

    /// The component that produced the event.
    pub fn source(&self) -> &'static str {
        match self {
            TriggerEvent::Commit { .. } => "git",
            TriggerEvent::Timer { .. } => "scheduler",
        }
    }

    /// Wall-clock instant the event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            TriggerEvent::Commit { info, .. } => info.timestamp,
            TriggerEvent::Timer { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn trigger_kind_round_trips_as_snake_case() {
        for kind in [TriggerKind::Commit, TriggerKind::Timer, TriggerKind::Manual] {
            let s = kind.to_string();
            assert_eq!(TriggerKind::from_str(&s).unwrap(), kind);
        }
        assert_eq!(TriggerKind::Commit.to_string(), "commit");
    }

    #[test]
    fn trigger_kind_serde_matches_wire_format() {
        let json = serde_json::to_string(&TriggerKind::Timer).unwrap();
        assert_eq!(json, "\"timer\"");
    }

    #[test]
    fn commit_event_exposes_commit_metadata() {
        let info = CommitInfo {
            hash: "a".repeat(40),
            message: "Fixed auth bug #123".to_string(),
            author: "alice".to_string(),
            timestamp: Utc::now(),
            files: vec!["src/auth.rs".to_string()],
            branch: Some("main".to_string()),
        };
        let event = TriggerEvent::Commit {
            repo_path: PathBuf::from("/work/repo"),
            info: info.clone(),
        };
        assert_eq!(event.kind(), TriggerKind::Commit);
        assert_eq!(event.source(), "git");
        assert_eq!(event.timestamp(), info.timestamp);
    }

    #[test]
    fn timer_event_reports_scheduler_source() {
        let at = Utc::now();
        let event = TriggerEvent::Timer {
            at,
            tick: TimerTick {
                count: 3,
                interval_minutes: 180,
            },
        };
        assert_eq!(event.kind(), TriggerKind::Timer);
        assert_eq!(event.source(), "scheduler");
        assert_eq!(event.timestamp(), at);
    }
}
