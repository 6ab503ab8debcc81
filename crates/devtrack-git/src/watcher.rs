// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem watcher emitting one event per HEAD advance.
//!
//! Watches the repository's `.git` tree (HEAD included) via `notify`,
//! filters out lock files and editor temporaries, waits a short settle
//! delay for Git to finish writing, then reads HEAD and compares against
//! the last-seen cursor. Emissions are serialized per repository and a
//! commit id is never emitted twice in a row.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use devtrack_core::{CommitInfo, DevtrackError};

use crate::commit::{is_git_repository, read_head_commit};

/// Time given to Git to finish writing HEAD before it is read back.
/// The repository write is not atomic from the watcher's point of view;
/// 100 ms is enough for the reference update to settle.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Lifecycle of a single repository watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    New,
    Watching,
    Stopped,
    /// Terminal until the watcher is reconstructed.
    Failed,
}

/// Watches one Git repository and emits [`CommitInfo`] on HEAD advances.
#[derive(Debug)]
pub struct GitWatcher {
    repo_path: PathBuf,
    settle_delay: Duration,
    cancel: CancellationToken,
    state: Arc<Mutex<WatcherState>>,
}

impl GitWatcher {
    /// Validate that `repo_path` is a Git working copy and build a watcher.
    pub fn new(repo_path: impl Into<PathBuf>) -> Result<Self, DevtrackError> {
        let repo_path = repo_path.into();
        if !is_git_repository(&repo_path) {
            return Err(DevtrackError::NotARepository { path: repo_path });
        }
        Ok(Self {
            repo_path,
            settle_delay: DEFAULT_SETTLE_DELAY,
            cancel: CancellationToken::new(),
            state: Arc::new(Mutex::new(WatcherState::New)),
        })
    }

    /// Override the settle delay (tests use a shorter one).
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn state(&self) -> WatcherState {
        *self.state.lock().expect("watcher state lock poisoned")
    }

    /// Attach the filesystem watch and spawn the event loop.
    ///
    /// The current HEAD is recorded as the cursor and not emitted. Detected
    /// commits are delivered in HEAD-advance order on `commits_tx`.
    pub async fn start(&self, commits_tx: mpsc::Sender<CommitInfo>) -> Result<(), DevtrackError> {
        let git_dir = self.repo_path.join(".git");

        // Bridge notify's callback thread into the async loop.
        let (raw_tx, mut raw_rx) = mpsc::channel::<Result<Event, notify::Error>>(256);
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
                let _ = raw_tx.blocking_send(res);
            })
            .map_err(|e| DevtrackError::WatcherUnavailable {
                source: Box::new(e),
            })?;
        watcher
            .watch(&git_dir, RecursiveMode::Recursive)
            .map_err(|e| DevtrackError::WatcherUnavailable {
                source: Box::new(e),
            })?;

        // Record the cursor; an unreadable HEAD (fresh repo) just means the
        // first commit will be emitted.
        let repo_path = self.repo_path.clone();
        let mut cursor = match tokio::task::spawn_blocking({
            let repo_path = repo_path.clone();
            move || read_head_commit(&repo_path)
        })
        .await
        .map_err(|e| DevtrackError::Internal(e.to_string()))?
        {
            Ok(info) => Some(info.hash),
            Err(e) => {
                warn!(repo = %repo_path.display(), error = %e, "could not read initial HEAD");
                None
            }
        };

        *self.state.lock().expect("watcher state lock poisoned") = WatcherState::Watching;
        info!(repo = %repo_path.display(), "git watcher started");

        let cancel = self.cancel.clone();
        let state = self.state.clone();
        let settle_delay = self.settle_delay;

        tokio::spawn(async move {
            // The notify watcher lives as long as this task.
            let _watcher = watcher;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        *state.lock().expect("watcher state lock poisoned") =
                            WatcherState::Stopped;
                        info!(repo = %repo_path.display(), "git watcher stopped");
                        return;
                    }
                    event = raw_rx.recv() => {
                        let event = match event {
                            Some(Ok(event)) => event,
                            Some(Err(e)) => {
                                // Transient watch errors: log and keep going.
                                warn!(repo = %repo_path.display(), error = %e, "watch error");
                                continue;
                            }
                            None => {
                                *state.lock().expect("watcher state lock poisoned") =
                                    WatcherState::Failed;
                                error!(
                                    repo = %repo_path.display(),
                                    "watch channel closed, watcher failed"
                                );
                                return;
                            }
                        };

                        if !is_relevant(&event) {
                            continue;
                        }

                        // Let Git finish writing before reading HEAD back.
                        tokio::time::sleep(settle_delay).await;

                        let head = tokio::task::spawn_blocking({
                            let repo_path = repo_path.clone();
                            move || read_head_commit(&repo_path)
                        })
                        .await;

                        let info = match head {
                            Ok(Ok(info)) => info,
                            Ok(Err(e)) => {
                                warn!(repo = %repo_path.display(), error = %e, "HEAD read failed");
                                continue;
                            }
                            Err(e) => {
                                warn!(repo = %repo_path.display(), error = %e, "HEAD read panicked");
                                continue;
                            }
                        };

                        if cursor.as_deref() == Some(info.hash.as_str()) {
                            continue;
                        }

                        debug!(
                            repo = %repo_path.display(),
                            commit = %&info.hash[..8.min(info.hash.len())],
                            "new commit detected"
                        );
                        cursor = Some(info.hash.clone());
                        if commits_tx.send(info).await.is_err() {
                            // Receiver gone: the monitor is shutting down.
                            *state.lock().expect("watcher state lock poisoned") =
                                WatcherState::Stopped;
                            return;
                        }
                    }
                }
            }
        });

        Ok(())
    }

    /// Release the watch; the event loop exits at its next suspension point.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Write/create events on real Git files. Lock files and editor
/// temporaries churn constantly and never signal a finished commit.
fn is_relevant(event: &Event) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        let name = path.to_string_lossy();
        !name.ends_with(".lock") && !name.ends_with('~')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::testutil::{commit_file, init_repo};
    use tempfile::tempdir;

    #[test]
    fn new_rejects_non_repository() {
        let dir = tempdir().unwrap();
        let err = GitWatcher::new(dir.path()).unwrap_err();
        assert!(matches!(err, DevtrackError::NotARepository { .. }));
    }

    #[test]
    fn lock_files_are_filtered() {
        let event = Event {
            kind: EventKind::Create(notify::event::CreateKind::File),
            paths: vec![PathBuf::from("/repo/.git/index.lock")],
            attrs: Default::default(),
        };
        assert!(!is_relevant(&event));

        let event = Event {
            kind: EventKind::Modify(notify::event::ModifyKind::Any),
            paths: vec![PathBuf::from("/repo/.git/HEAD")],
            attrs: Default::default(),
        };
        assert!(is_relevant(&event));
    }

    #[test]
    fn removal_events_are_filtered() {
        let event = Event {
            kind: EventKind::Remove(notify::event::RemoveKind::File),
            paths: vec![PathBuf::from("/repo/.git/HEAD")],
            attrs: Default::default(),
        };
        assert!(!is_relevant(&event));
    }

    #[tokio::test]
    async fn emits_once_per_head_advance() {
        let dir = tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "README.md", "hello", "initial commit");

        let watcher = GitWatcher::new(dir.path())
            .unwrap()
            .with_settle_delay(Duration::from_millis(20));
        let (tx, mut rx) = mpsc::channel(16);
        watcher.start(tx).await.unwrap();
        assert_eq!(watcher.state(), WatcherState::Watching);

        // Give the watch a moment to attach before committing.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let oid = commit_file(&repo, "src.rs", "fn main() {}", "Fixed auth bug #123");

        let info = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("commit should be detected")
            .expect("channel open");
        assert_eq!(info.hash, oid.to_string());
        assert_eq!(info.message, "Fixed auth bug #123");
        assert_eq!(info.author, "alice");
        assert!(!info.files.is_empty());

        // The initial commit (the cursor) must not arrive, and the new head
        // must not be emitted twice.
        let extra = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(extra.is_err(), "no further emissions expected");

        watcher.stop();
    }

    #[tokio::test]
    async fn stop_transitions_state() {
        let dir = tempdir().unwrap();
        let repo = init_repo(dir.path());
        commit_file(&repo, "a.txt", "x", "initial commit");

        let watcher = GitWatcher::new(dir.path()).unwrap();
        let (tx, _rx) = mpsc::channel(1);
        watcher.start(tx).await.unwrap();
        watcher.stop();

        tokio::time::timeout(Duration::from_secs(5), async {
            while watcher.state() != WatcherState::Stopped {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("watcher should reach Stopped");
    }
}
