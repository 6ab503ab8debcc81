// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `devtrack start`: assemble and run the daemon.
//!
//! Wires the event store, IPC server, Git watchers, and scheduler into the
//! integrated monitor, then waits for a termination signal. SIGHUP reloads
//! the configuration without restarting.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use devtrack_config::model::DevtrackConfig;
use devtrack_core::{DevtrackError, ProfileDir, TriggerEvent};
use devtrack_daemon::{
    acquire_instance_lock, install_signal_handler, IntegratedMonitor, PidFile, Scheduler,
    SchedulerConfig, PAUSED_KEY,
};
use devtrack_git::{install_post_commit_hook, GitWatcher};
use devtrack_ipc::{IpcMessage, IpcServer, MessageType};
use devtrack_storage::{EventStore, LogRecord};

/// Entry point for the `start` subcommand.
///
/// A single-instance violation is reported with the running PID and exits 0;
/// other startup errors are fatal and exit non-zero without a PID file.
pub async fn run_start(profile: &ProfileDir) -> i32 {
    if let Some(pid) = PidFile::new(profile.pid_path()).live_pid() {
        println!("✗ Daemon is already running (PID: {pid})");
        println!("  Use `devtrack status` for details, or `devtrack restart` to restart.");
        return 0;
    }

    println!("🚀 Starting DevTrack daemon...");
    match run_daemon(profile).await {
        Ok(()) => 0,
        Err(DevtrackError::AlreadyRunning { pid }) => {
            println!("✗ Daemon is already running (PID: {pid})");
            0
        }
        Err(e) => {
            eprintln!("✗ Failed to start daemon: {e}");
            eprintln!("  Check the configuration with `devtrack status`.");
            1
        }
    }
}

async fn run_daemon(profile: &ProfileDir) -> Result<(), DevtrackError> {
    profile.ensure()?;

    // Configuration errors are fatal and must precede the PID file.
    let config = devtrack_config::load_and_validate(profile)?;

    let pid_file = acquire_instance_lock(profile)?;
    init_tracing(profile, &config.settings.log_level);

    let result = run_wired(profile, &config).await;

    pid_file.remove();
    result
}

async fn run_wired(profile: &ProfileDir, config: &DevtrackConfig) -> Result<(), DevtrackError> {
    info!(
        pid = std::process::id(),
        config = %profile.config_path().display(),
        "starting devtrack daemon"
    );

    let store = Arc::new(EventStore::open(profile.db_path()).await?);
    // Scheduler state is in-memory and lost on restart; reset the mirror.
    store.set_config(PAUSED_KEY, "false").await?;
    store
        .insert_log(&LogRecord::now("info", "daemon", "daemon started"))
        .await
        .ok();

    let ipc = Arc::new(IpcServer::new(profile.socket_path()));
    ipc.start().await?;

    let (events_tx, events_rx) = mpsc::channel::<TriggerEvent>(64);

    let scheduler = Arc::new(Scheduler::new(
        SchedulerConfig::from(&config.settings),
        events_tx.clone(),
    ));
    scheduler.start()?;

    let watchers = start_watchers(profile, config, &events_tx).await;

    let monitor = Arc::new(IntegratedMonitor::new(
        store.clone(),
        ipc.clone(),
        scheduler.clone(),
    ));
    monitor.register_handlers().await;

    let (cancel, mut reload_rx) = install_signal_handler();
    let monitor_task = tokio::spawn(monitor.clone().run(events_rx, cancel.clone()));

    info!(repos = watchers.len(), "daemon running");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            reload = reload_rx.recv() => {
                if reload.is_none() {
                    continue;
                }
                match devtrack_config::load_and_validate(profile) {
                    Ok(new_config) => {
                        scheduler.apply_settings(SchedulerConfig::from(&new_config.settings));
                        let msg = IpcMessage::new(
                            MessageType::ConfigUpdate,
                            serde_json::to_value(&new_config.settings)
                                .unwrap_or_else(|_| serde_json::json!({})),
                        );
                        ipc.send_message(&msg).await.ok();
                        info!("configuration reloaded");
                    }
                    Err(e) => {
                        error!(error = %e, "configuration reload failed, keeping previous config");
                    }
                }
            }
        }
    }

    info!("shutting down daemon");
    scheduler.stop();
    for watcher in &watchers {
        watcher.stop();
    }
    let _ = monitor_task.await;
    // Broadcasts `shutdown`, waits the grace period, unlinks the socket.
    ipc.stop().await;
    store
        .insert_log(&LogRecord::now("info", "daemon", "daemon stopped"))
        .await
        .ok();
    store.close().await.ok();
    info!("daemon shutdown complete");
    Ok(())
}

/// Attach a watcher to every enabled repository. A repository that fails
/// validation is skipped with a warning; the daemon still runs the timer.
async fn start_watchers(
    profile: &ProfileDir,
    config: &DevtrackConfig,
    events_tx: &mpsc::Sender<TriggerEvent>,
) -> Vec<GitWatcher> {
    let mut watchers = Vec::new();

    for repo in config.enabled_repositories() {
        let watcher = match GitWatcher::new(&repo.path) {
            Ok(watcher) => watcher,
            Err(e) => {
                warn!(repo = %repo.path.display(), error = %e, "skipping repository");
                continue;
            }
        };

        let (commit_tx, mut commit_rx) = mpsc::channel(16);
        if let Err(e) = watcher.start(commit_tx).await {
            warn!(repo = %repo.path.display(), error = %e, "failed to start watcher");
            continue;
        }

        // Advisory only; the watcher works without it.
        if let Err(e) = install_post_commit_hook(&repo.path, profile) {
            warn!(repo = %repo.path.display(), error = %e, "could not install post-commit hook");
        }

        let events_tx = events_tx.clone();
        let repo_path = repo.path.clone();
        tokio::spawn(async move {
            while let Some(info) = commit_rx.recv().await {
                let event = TriggerEvent::Commit {
                    repo_path: repo_path.clone(),
                    info,
                };
                if events_tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        info!(repo = %repo.path.display(), name = %repo.name, "watching repository");
        watchers.push(watcher);
    }

    watchers
}

/// Redirect the tracing subscriber to the profile's log file.
fn init_tracing(profile: &ProfileDir, log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("devtrack={log_level},warn")));

    let writer: Box<dyn std::io::Write + Send> = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(profile.log_path())
    {
        Ok(file) => Box::new(file),
        Err(_) => Box::new(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(std::sync::Mutex::new(writer))
        .init();
}
