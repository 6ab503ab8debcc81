// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The IPC wire envelope and typed payloads.
//!
//! Messages are UTF-8 JSON objects terminated by a single newline byte:
//! `{"type", "timestamp", "id", "data", "error"?}`. The envelope is stable;
//! unknown types deserialize to [`MessageType::Unknown`] and are discarded
//! by the receiver, so new types are backward compatible.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use devtrack_core::{CommitInfo, DevtrackError, TimerTick};

/// Enumerated message types on the bus.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    // Daemon -> intelligence peer.
    CommitTrigger,
    TimerTrigger,
    StatusQuery,
    ConfigUpdate,
    Shutdown,
    // Intelligence peer -> daemon.
    Response,
    TaskUpdate,
    PromptRequest,
    // Either direction.
    Error,
    Ack,
    /// Forward-compatibility fallback: logged and discarded on receipt.
    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

/// The shared message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
    pub id: String,
    #[serde(default = "empty_object")]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({})
}

/// Payload of a `commit_trigger` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitTriggerData {
    pub repo_path: String,
    pub commit_hash: String,
    pub commit_message: String,
    pub author: String,
    /// RFC-3339 instant of the commit itself.
    pub timestamp: String,
    pub files_changed: Vec<String>,
    #[serde(default)]
    pub branch: String,
}

impl CommitTriggerData {
    pub fn from_commit(repo_path: &str, info: &CommitInfo) -> Self {
        Self {
            repo_path: repo_path.to_string(),
            commit_hash: info.hash.clone(),
            commit_message: info.message.clone(),
            author: info.author.clone(),
            timestamp: info.timestamp.to_rfc3339(),
            files_changed: info.files.clone(),
            branch: info.branch.clone().unwrap_or_default(),
        }
    }
}

/// Payload of a `timer_trigger` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerTriggerData {
    /// RFC-3339 instant of the firing.
    pub timestamp: String,
    pub interval_mins: u32,
    pub trigger_count: u64,
}

impl TimerTriggerData {
    pub fn from_tick(at: DateTime<Utc>, tick: TimerTick) -> Self {
        Self {
            timestamp: at.to_rfc3339(),
            interval_mins: tick.interval_minutes,
            trigger_count: tick.count,
        }
    }
}

/// Payload of a `task_update` message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskUpdateData {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub ticket_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub time_spent: String,
    #[serde(default)]
    pub synced: bool,
}

/// Payload of an `ack` message: references the acknowledged message's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckData {
    pub id: String,
}

impl IpcMessage {
    /// Build a message with a fresh id and the current wall clock.
    pub fn new(message_type: MessageType, data: serde_json::Value) -> Self {
        Self {
            message_type,
            timestamp: Utc::now(),
            id: Uuid::new_v4().to_string(),
            data,
            error: None,
        }
    }

    pub fn commit_trigger(data: &CommitTriggerData) -> Self {
        Self::new(
            MessageType::CommitTrigger,
            serde_json::to_value(data).expect("commit trigger payload serializes"),
        )
    }

    pub fn timer_trigger(data: &TimerTriggerData) -> Self {
        Self::new(
            MessageType::TimerTrigger,
            serde_json::to_value(data).expect("timer trigger payload serializes"),
        )
    }

    pub fn task_update(data: &TaskUpdateData) -> Self {
        Self::new(
            MessageType::TaskUpdate,
            serde_json::to_value(data).expect("task update payload serializes"),
        )
    }

    pub fn shutdown() -> Self {
        Self::new(MessageType::Shutdown, empty_object())
    }

    /// Acknowledge the message with id `of_id`.
    pub fn ack(of_id: &str) -> Self {
        Self::new(
            MessageType::Ack,
            serde_json::to_value(AckData {
                id: of_id.to_string(),
            })
            .expect("ack payload serializes"),
        )
    }

    /// An `error` message: empty data, `error` populated.
    pub fn error(message: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageType::Error, empty_object());
        msg.error = Some(message.into());
        msg
    }

    /// Deserialize the `data` object into a typed payload.
    pub fn parse_data<T: DeserializeOwned>(&self) -> Result<T, DevtrackError> {
        serde_json::from_value(self.data.clone()).map_err(|e| DevtrackError::MalformedMessage {
            detail: format!("bad {} payload: {e}", self.message_type),
        })
    }

    /// Serialize to one newline-terminated frame.
    ///
    /// serde_json escapes control characters, so the frame never contains an
    /// embedded newline.
    pub fn to_line(&self) -> Result<String, DevtrackError> {
        let mut line =
            serde_json::to_string(self).map_err(|e| DevtrackError::Internal(e.to_string()))?;
        line.push('\n');
        Ok(line)
    }

    /// Parse one frame (with or without its trailing newline).
    pub fn from_line(line: &str) -> Result<Self, DevtrackError> {
        serde_json::from_str(line.trim_end_matches('\n')).map_err(|e| {
            DevtrackError::MalformedMessage {
                detail: e.to_string(),
            }
        })
    }
}
