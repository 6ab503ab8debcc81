// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Git repository watching for the DevTrack daemon.
//!
//! One [`GitWatcher`] per repository subscribes to filesystem events on the
//! `.git` tree and emits a [`devtrack_core::CommitInfo`] for every HEAD
//! advance, exactly once per new commit id.

pub mod commit;
pub mod hook;
pub mod watcher;

pub use commit::{is_git_repository, read_head_commit};
pub use hook::install_post_commit_hook;
pub use watcher::{GitWatcher, WatcherState, DEFAULT_SETTLE_DELAY};
