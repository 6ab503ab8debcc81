// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The integrated monitor: fan-in of commit and timer events.
//!
//! Every event is persisted to the event store *before* it is published on
//! the IPC bus, so the store's monotonic ids are the authoritative ordering
//! and a dropped IPC message can be reprocessed from the store. Inbound
//! messages (task updates, responses, acks, errors, operator commands) are
//! persisted or dispatched here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use devtrack_core::{DevtrackError, TriggerEvent};
use devtrack_ipc::{
    AckData, CommitTriggerData, FnHandler, IpcMessage, IpcServer, MessageType, TaskUpdateData,
    TimerTriggerData,
};
use devtrack_storage::{EventStore, LogRecord, ResponseRecord, TaskUpdateRecord, TriggerRecord};

use crate::scheduler::Scheduler;

/// Store key mirroring the scheduler's pause flag for out-of-process status.
pub const PAUSED_KEY: &str = "scheduler.paused";

/// Operator command carried in a `prompt_request` message.
#[derive(Debug, Deserialize)]
struct ControlCommand {
    command: String,
}

/// Application-defined `response` payload.
#[derive(Debug, Deserialize)]
struct ResponseData {
    trigger_id: i64,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    ticket_id: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    time_spent: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    raw_input: String,
}

/// Wires the Git watchers and the scheduler into one trigger pipeline with
/// uniform persistence and publication.
pub struct IntegratedMonitor {
    store: Arc<EventStore>,
    ipc: Arc<IpcServer>,
    scheduler: Arc<Scheduler>,
    /// Task-update message id -> row id, so a later `ack` flips the record.
    pending_acks: Arc<Mutex<HashMap<String, i64>>>,
}

impl IntegratedMonitor {
    pub fn new(store: Arc<EventStore>, ipc: Arc<IpcServer>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            store,
            ipc,
            scheduler,
            pending_acks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Consume trigger events until cancellation. Events are processed one
    /// at a time, which also serializes scheduler firings.
    pub async fn run(
        self: Arc<Self>,
        mut events_rx: mpsc::Receiver<TriggerEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("integrated monitor shutting down");
                    return;
                }
                event = events_rx.recv() => {
                    match event {
                        Some(event) => self.handle_trigger(event).await,
                        None => {
                            info!("trigger channel closed, monitor exiting");
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Persist, then publish. Both failure legs are logged and swallowed:
    /// a store failure must not suppress publication, and a publish failure
    /// leaves the stored row for reprocessing.
    pub async fn handle_trigger(&self, event: TriggerEvent) {
        let record = to_record(&event);
        let trigger_id = match self.store.insert_trigger(&record).await {
            Ok(id) => {
                info!(id, kind = %event.kind(), "trigger persisted");
                Some(id)
            }
            Err(e) => {
                error!(error = %e, "failed to persist trigger, publishing anyway");
                None
            }
        };

        let msg = to_message(&event, trigger_id);
        if let Err(e) = self.ipc.send_message(&msg).await {
            warn!(error = %e, "failed to publish trigger, record remains in store");
        }
    }

    /// Register the inbound message handlers on the IPC server.
    pub async fn register_handlers(self: &Arc<Self>) {
        let monitor = self.clone();
        self.ipc
            .register_handler(
                MessageType::TaskUpdate,
                Arc::new(FnHandler(move |msg: IpcMessage| {
                    let monitor = monitor.clone();
                    async move { monitor.on_task_update(msg).await }
                })),
            )
            .await;

        let monitor = self.clone();
        self.ipc
            .register_handler(
                MessageType::Response,
                Arc::new(FnHandler(move |msg: IpcMessage| {
                    let monitor = monitor.clone();
                    async move { monitor.on_response(msg).await }
                })),
            )
            .await;

        let monitor = self.clone();
        self.ipc
            .register_handler(
                MessageType::Ack,
                Arc::new(FnHandler(move |msg: IpcMessage| {
                    let monitor = monitor.clone();
                    async move { monitor.on_ack(msg).await }
                })),
            )
            .await;

        let monitor = self.clone();
        self.ipc
            .register_handler(
                MessageType::Error,
                Arc::new(FnHandler(move |msg: IpcMessage| {
                    let monitor = monitor.clone();
                    async move { monitor.on_error(msg).await }
                })),
            )
            .await;

        let monitor = self.clone();
        self.ipc
            .register_handler(
                MessageType::PromptRequest,
                Arc::new(FnHandler(move |msg: IpcMessage| {
                    let monitor = monitor.clone();
                    async move { monitor.on_prompt_request(msg).await }
                })),
            )
            .await;
    }

    /// Inbound `task_update`: persisted unsynced with platform "pending";
    /// the integration acknowledges sync later via `ack`.
    async fn on_task_update(&self, msg: IpcMessage) -> Result<(), DevtrackError> {
        let data: TaskUpdateData = msg.parse_data()?;
        let record = TaskUpdateRecord {
            id: 0,
            response_id: None,
            timestamp: Utc::now(),
            project: data.project,
            ticket_id: data.ticket_id,
            update_text: Some(data.description),
            status: Some(data.status),
            synced: false,
            synced_at: None,
            platform: "pending".to_string(),
            error: None,
        };
        match self.store.insert_task_update(&record).await {
            Ok(row_id) => {
                self.pending_acks.lock().await.insert(msg.id.clone(), row_id);
                info!(row_id, ticket = %record.ticket_id, "task update persisted");
            }
            Err(e) => {
                // Per-event failure: the update is dropped, the peer can re-emit.
                warn!(error = %e, "failed to persist task update");
            }
        }
        Ok(())
    }

    /// Inbound `response`: persisted against its trigger, which is then
    /// marked processed.
    async fn on_response(&self, msg: IpcMessage) -> Result<(), DevtrackError> {
        let data: ResponseData = msg.parse_data()?;
        let record = ResponseRecord {
            id: 0,
            trigger_id: data.trigger_id,
            timestamp: Utc::now(),
            project: data.project,
            ticket_id: data.ticket_id,
            description: data.description,
            time_spent: data.time_spent,
            status: data.status,
            raw_input: data.raw_input,
        };
        match self.store.insert_response(&record).await {
            Ok(_) => {
                if let Err(e) = self.store.mark_trigger_processed(data.trigger_id).await {
                    warn!(error = %e, trigger_id = data.trigger_id, "failed to mark trigger processed");
                }
                info!(trigger_id = data.trigger_id, "response persisted");
            }
            Err(e) => warn!(error = %e, "failed to persist response"),
        }
        Ok(())
    }

    /// Inbound `ack` of an earlier `task_update`: flips the row to synced.
    async fn on_ack(&self, msg: IpcMessage) -> Result<(), DevtrackError> {
        let data: AckData = msg.parse_data()?;
        let row_id = self.pending_acks.lock().await.remove(&data.id);
        match row_id {
            Some(row_id) => {
                self.store.mark_task_update_synced(row_id, Utc::now()).await?;
                info!(row_id, "task update acknowledged as synced");
            }
            None => {
                info!(acked = %data.id, "ack for unknown message id");
            }
        }
        Ok(())
    }

    /// Inbound `error`: persisted as an error-level log record.
    async fn on_error(&self, msg: IpcMessage) -> Result<(), DevtrackError> {
        let message = msg.error.unwrap_or_else(|| "unspecified peer error".to_string());
        warn!(peer_error = %message, "error reported by IPC peer");
        if let Err(e) = self
            .store
            .insert_log(&LogRecord::now("error", "ipc_peer", message))
            .await
        {
            warn!(error = %e, "failed to persist peer error");
        }
        Ok(())
    }

    /// Inbound `prompt_request`: operator control dispatch.
    ///
    /// `pause`/`resume`/`force_trigger`/`skip_next` act on the scheduler;
    /// `send_summary` is relayed to the intelligence peer. Every accepted
    /// command is acknowledged with `ack`.
    async fn on_prompt_request(&self, msg: IpcMessage) -> Result<(), DevtrackError> {
        let ControlCommand { command } = msg.parse_data()?;
        info!(command = %command, "operator command received");

        match command.as_str() {
            "pause" => {
                self.scheduler.pause();
                self.mirror_paused(true).await;
            }
            "resume" => {
                self.scheduler.resume();
                self.mirror_paused(false).await;
            }
            "force_trigger" => {
                self.scheduler.force_immediate().await?;
            }
            "skip_next" => {
                self.scheduler.skip_next();
            }
            "send_summary" => {
                // The daemon does not render reports; relay to the peer.
                let relay = IpcMessage::new(
                    MessageType::PromptRequest,
                    serde_json::json!({ "command": "send_summary" }),
                );
                self.ipc.send_message(&relay).await?;
            }
            other => {
                warn!(command = %other, "unknown operator command");
                self.ipc
                    .send_message(&IpcMessage::error(format!("unknown command: {other}")))
                    .await?;
                return Ok(());
            }
        }

        self.ipc.send_message(&IpcMessage::ack(&msg.id)).await
    }

    /// Mirror the pause flag into the store so `status` can read it from
    /// outside the daemon process.
    async fn mirror_paused(&self, paused: bool) {
        if let Err(e) = self
            .store
            .set_config(PAUSED_KEY, if paused { "true" } else { "false" })
            .await
        {
            warn!(error = %e, "failed to mirror pause flag");
        }
    }
}

/// Convert a trigger event into its store row.
fn to_record(event: &TriggerEvent) -> TriggerRecord {
    match event {
        TriggerEvent::Commit { repo_path, info } => TriggerRecord {
            id: 0,
            trigger_type: event.kind(),
            timestamp: info.timestamp,
            source: event.source().to_string(),
            repo_path: Some(repo_path.to_string_lossy().into_owned()),
            commit_hash: Some(info.hash.clone()),
            commit_message: Some(info.message.clone()),
            author: Some(info.author.clone()),
            data: serde_json::to_string(&serde_json::json!({
                "files_changed": info.files,
                "branch": info.branch,
            }))
            .ok(),
            processed: false,
        },
        TriggerEvent::Timer { at, tick } => TriggerRecord {
            id: 0,
            trigger_type: event.kind(),
            timestamp: *at,
            source: event.source().to_string(),
            repo_path: None,
            commit_hash: None,
            commit_message: None,
            author: None,
            data: serde_json::to_string(&serde_json::json!({
                "trigger_count": tick.count,
                "interval_minutes": tick.interval_minutes,
            }))
            .ok(),
            processed: false,
        },
    }
}

/// Convert a trigger event into its IPC message. `trigger_id` is the store
/// row id (when persistence succeeded), included so the peer can reference
/// the trigger in its `response`.
fn to_message(event: &TriggerEvent, trigger_id: Option<i64>) -> IpcMessage {
    let mut msg = match event {
        TriggerEvent::Commit { repo_path, info } => IpcMessage::commit_trigger(
            &CommitTriggerData::from_commit(&repo_path.to_string_lossy(), info),
        ),
        TriggerEvent::Timer { at, tick } => {
            IpcMessage::timer_trigger(&TimerTriggerData::from_tick(*at, *tick))
        }
    };
    if let (Some(id), Some(obj)) = (trigger_id, msg.data.as_object_mut()) {
        obj.insert("trigger_id".to_string(), serde_json::json!(id));
    }
    msg
}
