// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control-surface commands against a running daemon.
//!
//! Operator commands travel over the IPC socket as `prompt_request`
//! messages and are confirmed by an `ack` referencing the request id.
//! `stop`, `logs`, and `db-stats` work directly on the profile directory.

use std::time::Duration;

use devtrack_core::{DevtrackError, ProfileDir};
use devtrack_daemon::{kill_daemon, tail_log, PidFile};
use devtrack_ipc::{AckData, IpcClient, IpcMessage, MessageType};
use devtrack_storage::EventStore;

/// How long to wait for the daemon to acknowledge a control command.
const ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Send one operator command and wait for its acknowledgement.
pub async fn send_command(profile: &ProfileDir, command: &str, done: &str) -> i32 {
    if PidFile::new(profile.pid_path()).live_pid().is_none() {
        println!("✗ Daemon is not running");
        println!("  Start it with: devtrack start");
        return 1;
    }

    match dispatch(profile, command).await {
        Ok(()) => {
            println!("✓ {done}");
            0
        }
        Err(e) => {
            eprintln!("✗ {command} failed: {e}");
            eprintln!("  Check the daemon log: devtrack logs");
            1
        }
    }
}

async fn dispatch(profile: &ProfileDir, command: &str) -> Result<(), DevtrackError> {
    let client = IpcClient::new(profile.socket_path());
    client.connect().await?;

    let request = IpcMessage::new(
        MessageType::PromptRequest,
        serde_json::json!({ "command": command }),
    );
    client.send_message(&request).await?;

    // The bus broadcasts; skip unrelated traffic until our ack arrives.
    let wait_for_ack = async {
        loop {
            let msg = client.receive_message().await?;
            match msg.message_type {
                MessageType::Ack => {
                    if let Ok(AckData { id }) = msg.parse_data::<AckData>() {
                        if id == request.id {
                            return Ok(());
                        }
                    }
                }
                MessageType::Error => {
                    return Err(DevtrackError::Internal(
                        msg.error.unwrap_or_else(|| "daemon rejected the command".into()),
                    ));
                }
                _ => {}
            }
        }
    };

    let result = tokio::time::timeout(ACK_TIMEOUT, wait_for_ack)
        .await
        .map_err(|_| DevtrackError::Internal("timed out waiting for acknowledgement".into()))?;
    client.disconnect().await;
    result
}

/// `devtrack stop`: graceful termination via SIGTERM, escalating to SIGKILL.
pub async fn run_stop(profile: &ProfileDir) -> i32 {
    println!("⏹  Stopping DevTrack daemon...");
    match kill_daemon(&profile.pid_path()).await {
        Ok(()) => {
            println!("✓ Daemon stopped");
            0
        }
        Err(DevtrackError::NotRunning) => {
            println!("✗ Daemon is not running");
            0
        }
        Err(e) => {
            eprintln!("✗ Failed to stop daemon: {e}");
            1
        }
    }
}

/// `devtrack logs N`: the last N lines of the daemon log.
pub fn run_logs(profile: &ProfileDir, lines: usize) -> i32 {
    match tail_log(&profile.log_path(), lines) {
        Ok(log_lines) => {
            for line in log_lines {
                println!("{line}");
            }
            0
        }
        Err(_) => {
            println!("✗ No log file at {}", profile.log_path().display());
            println!("  The daemon writes it on first start: devtrack start");
            1
        }
    }
}

/// `devtrack db-stats`: event-store table counts.
pub async fn run_db_stats(profile: &ProfileDir) -> i32 {
    if !profile.db_path().exists() {
        println!("✗ No event store at {}", profile.db_path().display());
        println!("  The daemon creates it on first start: devtrack start");
        return 1;
    }

    let store = match EventStore::open(profile.db_path()).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("✗ Could not open event store: {e}");
            return 1;
        }
    };

    match store.stats().await {
        Ok(stats) => {
            println!();
            println!("  Event store statistics");
            println!("  {}", "─".repeat(40));
            println!("    Triggers:         {}", stats.triggers);
            println!("    Responses:        {}", stats.responses);
            println!("    Task updates:     {}", stats.task_updates);
            println!("    Unsynced updates: {}", stats.unsynced_updates);
            println!("    Log entries:      {}", stats.logs);
            println!("    Database:         {}", stats.database_path.display());
            println!();
            store.close().await.ok();
            0
        }
        Err(e) => {
            eprintln!("✗ Could not read statistics: {e}");
            1
        }
    }
}
