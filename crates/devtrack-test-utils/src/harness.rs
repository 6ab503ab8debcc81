// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! Assembles the daemon pipeline (temp profile, event store, IPC server,
//! scheduler, integrated monitor) without the process-level supervisor, so
//! tests can drive triggers and peers directly and stay isolated.

use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use devtrack_core::{DevtrackError, ProfileDir, TriggerEvent};
use devtrack_daemon::{IntegratedMonitor, Scheduler, SchedulerConfig};
use devtrack_ipc::{IpcClient, IpcServer};
use devtrack_storage::EventStore;

/// A complete daemon pipeline rooted in a temporary profile directory.
pub struct TestHarness {
    pub profile: ProfileDir,
    pub store: Arc<EventStore>,
    pub ipc: Arc<IpcServer>,
    pub scheduler: Arc<Scheduler>,
    pub monitor: Arc<IntegratedMonitor>,
    pub events_tx: mpsc::Sender<TriggerEvent>,
    cancel: CancellationToken,
    _temp: TempDir,
}

impl TestHarness {
    /// Build and start the pipeline. Each harness is fully independent.
    pub async fn start() -> Result<Self, DevtrackError> {
        Self::start_with_config(SchedulerConfig {
            interval_minutes: 180,
            work_hours_only: false,
            work_start_hour: 9,
            work_end_hour: 18,
        })
        .await
    }

    pub async fn start_with_config(config: SchedulerConfig) -> Result<Self, DevtrackError> {
        let temp = TempDir::new()
            .map_err(|e| DevtrackError::Internal(format!("tempdir failed: {e}")))?;
        let profile = ProfileDir::at(temp.path());
        profile.ensure()?;

        let store = Arc::new(EventStore::open(profile.db_path()).await?);
        let ipc = Arc::new(IpcServer::new(profile.socket_path()));
        ipc.start().await?;

        let (events_tx, events_rx) = mpsc::channel(16);
        let scheduler = Arc::new(Scheduler::new(config, events_tx.clone()));

        let monitor = Arc::new(IntegratedMonitor::new(
            store.clone(),
            ipc.clone(),
            scheduler.clone(),
        ));
        monitor.register_handlers().await;

        let cancel = CancellationToken::new();
        tokio::spawn(monitor.clone().run(events_rx, cancel.clone()));

        Ok(Self {
            profile,
            store,
            ipc,
            scheduler,
            monitor,
            events_tx,
            cancel,
            _temp: temp,
        })
    }

    /// A fresh, unconnected peer for this harness's socket.
    pub fn client(&self) -> IpcClient {
        IpcClient::new(self.profile.socket_path())
    }

    /// Wait until the server sees `n` connected peers.
    pub async fn wait_for_clients(&self, n: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while self.ipc.client_count().await < n {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("timed out waiting for IPC clients");
    }

    /// Tear the pipeline down.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.ipc.stop().await;
        self.store.close().await.ok();
    }
}
