// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-user profile directory holding all daemon state.
//!
//! Every on-disk path (config, PID file, log, database, IPC socket) derives
//! from a single `ProfileDir` resolved once at startup and passed explicitly
//! to each component. `DEVTRACK_HOME` overrides the default `~/.devtrack`,
//! which is what the test harness uses for isolation.

use std::path::{Path, PathBuf};

use crate::error::DevtrackError;

/// Environment variable overriding the profile directory location.
pub const PROFILE_ENV: &str = "DEVTRACK_HOME";

/// The per-user directory containing all DevTrack state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDir {
    root: PathBuf,
}

impl ProfileDir {
    /// Resolve the profile directory: `$DEVTRACK_HOME` if set, otherwise
    /// `~/.devtrack`.
    pub fn resolve() -> Result<Self, DevtrackError> {
        if let Some(root) = std::env::var_os(PROFILE_ENV) {
            return Ok(Self { root: root.into() });
        }
        let home = dirs::home_dir()
            .ok_or_else(|| DevtrackError::Config("could not determine home directory".into()))?;
        Ok(Self {
            root: home.join(".devtrack"),
        })
    }

    /// Use an explicit root, bypassing environment resolution.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the profile directory if it does not exist.
    pub fn ensure(&self) -> Result<(), DevtrackError> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            DevtrackError::Config(format!(
                "failed to create profile directory {}: {e}",
                self.root.display()
            ))
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// User settings, YAML.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    /// Single-instance lock, ASCII decimal PID.
    pub fn pid_path(&self) -> PathBuf {
        self.root.join("daemon.pid")
    }

    /// Redirected log output, append-only.
    pub fn log_path(&self) -> PathBuf {
        self.root.join("daemon.log")
    }

    /// Event-store database, single file.
    pub fn db_path(&self) -> PathBuf {
        self.root.join("devtrack.db")
    }

    /// IPC endpoint (Unix domain socket).
    pub fn socket_path(&self) -> PathBuf {
        self.root.join("devtrack.sock")
    }

    /// Advisory log appended by the post-commit hook.
    pub fn commit_log_path(&self) -> PathBuf {
        self.root.join("commit.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_root() {
        let profile = ProfileDir::at("/home/alice/.devtrack");
        assert_eq!(
            profile.config_path(),
            PathBuf::from("/home/alice/.devtrack/config.yaml")
        );
        assert_eq!(
            profile.pid_path(),
            PathBuf::from("/home/alice/.devtrack/daemon.pid")
        );
        assert_eq!(
            profile.db_path(),
            PathBuf::from("/home/alice/.devtrack/devtrack.db")
        );
        assert_eq!(
            profile.socket_path(),
            PathBuf::from("/home/alice/.devtrack/devtrack.sock")
        );
    }

    #[test]
    fn ensure_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ProfileDir::at(dir.path().join("nested/.devtrack"));
        profile.ensure().unwrap();
        assert!(profile.root().is_dir());
        // Second call is a no-op.
        profile.ensure().unwrap();
    }
}
