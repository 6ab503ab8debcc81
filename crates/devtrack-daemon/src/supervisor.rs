// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daemon lifecycle: single-instance PID file, liveness probes, forced
//! termination, and log tailing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use devtrack_core::{DevtrackError, ProfileDir};

/// Liveness poll cadence while waiting for a terminated daemon to exit.
const KILL_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Polls before escalating to an unconditional kill (10 x 500 ms = 5 s).
const KILL_POLL_ATTEMPTS: u32 = 10;

/// The single-instance lock: an ASCII decimal PID in `daemon.pid`.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored PID, if the file exists and parses.
    pub fn read(&self) -> Option<i32> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        data.trim().parse().ok()
    }

    /// Write the current process id atomically (temp sibling + rename).
    pub fn write(&self) -> Result<(), DevtrackError> {
        let tmp = self.path.with_extension("pid.tmp");
        std::fs::write(&tmp, std::process::id().to_string())
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| DevtrackError::Internal(format!("failed to write PID file: {e}")))
    }

    pub fn remove(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, "failed to remove PID file");
            }
        }
    }

    /// The PID of a live daemon holding this file, if any.
    pub fn live_pid(&self) -> Option<i32> {
        self.read().filter(|&pid| process_alive(pid))
    }
}

/// Probe whether a process exists (signal 0; nothing is delivered).
pub fn process_alive(pid: i32) -> bool {
    #[cfg(unix)]
    {
        // Safety: kill with signal 0 only performs the existence/permission check.
        unsafe { libc::kill(pid, 0) == 0 }
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        false
    }
}

/// Enforce the single-instance guarantee for a fresh daemon start.
///
/// A PID file naming a live process is `AlreadyRunning`; a stale file is
/// removed and startup proceeds.
pub fn acquire_instance_lock(profile: &ProfileDir) -> Result<PidFile, DevtrackError> {
    let pid_file = PidFile::new(profile.pid_path());

    if let Some(pid) = pid_file.read() {
        if process_alive(pid) {
            return Err(DevtrackError::AlreadyRunning { pid });
        }
        warn!(pid, "removing stale PID file");
        pid_file.remove();
    }

    profile.ensure()?;
    pid_file.write()?;
    Ok(pid_file)
}

/// Terminate the daemon named by `pid_file`: SIGTERM, up to 5 seconds of
/// liveness polling, then SIGKILL. The PID file is removed in every path.
pub async fn kill_daemon(pid_file: &Path) -> Result<(), DevtrackError> {
    let pid_file = PidFile::new(pid_file);
    let Some(pid) = pid_file.read() else {
        return Err(DevtrackError::NotRunning);
    };

    #[cfg(unix)]
    {
        if !process_alive(pid) {
            pid_file.remove();
            return Err(DevtrackError::NotRunning);
        }

        // Safety: plain signal delivery to a PID we just probed.
        unsafe {
            libc::kill(pid, libc::SIGTERM);
        }

        for _ in 0..KILL_POLL_ATTEMPTS {
            if !process_alive(pid) {
                pid_file.remove();
                return Ok(());
            }
            tokio::time::sleep(KILL_POLL_INTERVAL).await;
        }

        warn!(pid, "daemon did not exit gracefully, sending SIGKILL");
        unsafe {
            libc::kill(pid, libc::SIGKILL);
        }
        pid_file.remove();
        Ok(())
    }

    #[cfg(not(unix))]
    {
        pid_file.remove();
        Err(DevtrackError::Internal(format!(
            "forced termination of PID {pid} is not supported on this platform"
        )))
    }
}

/// The last `lines` lines of the daemon log. The whole file is read and
/// sliced; rotation is left to external tooling.
pub fn tail_log(log_path: &Path, lines: usize) -> Result<Vec<String>, DevtrackError> {
    let data = std::fs::read_to_string(log_path)
        .map_err(|e| DevtrackError::Internal(format!("failed to read log file: {e}")))?;
    let all: Vec<String> = data.lines().map(str::to_string).collect();
    let start = all.len().saturating_sub(lines);
    Ok(all[start..].to_vec())
}

/// Uptime derived from the log file's modification time.
pub fn uptime_from_log(log_path: &Path) -> Option<Duration> {
    let modified = std::fs::metadata(log_path).ok()?.modified().ok()?;
    modified.elapsed().ok()
}

/// Format an uptime for the status table.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn pid_file_round_trip() {
        let dir = tempdir().unwrap();
        let pid_file = PidFile::new(dir.path().join("daemon.pid"));

        assert!(pid_file.read().is_none());
        pid_file.write().unwrap();
        assert_eq!(pid_file.read(), Some(std::process::id() as i32));

        pid_file.remove();
        assert!(pid_file.read().is_none());
        // Removing again is harmless.
        pid_file.remove();
    }

    #[test]
    fn own_process_is_alive() {
        assert!(process_alive(std::process::id() as i32));
    }

    #[test]
    fn acquire_lock_rejects_live_instance() {
        let dir = tempdir().unwrap();
        let profile = ProfileDir::at(dir.path());
        profile.ensure().unwrap();

        // Simulate a running daemon by writing our own (live) PID.
        std::fs::write(profile.pid_path(), std::process::id().to_string()).unwrap();

        let err = acquire_instance_lock(&profile).unwrap_err();
        match err {
            DevtrackError::AlreadyRunning { pid } => {
                assert_eq!(pid, std::process::id() as i32);
            }
            other => panic!("expected AlreadyRunning, got {other}"),
        }
    }

    #[test]
    fn acquire_lock_recovers_stale_file() {
        let dir = tempdir().unwrap();
        let profile = ProfileDir::at(dir.path());
        profile.ensure().unwrap();

        // A PID that cannot be a live process.
        std::fs::write(profile.pid_path(), "999999999").unwrap();

        let pid_file = acquire_instance_lock(&profile).unwrap();
        assert_eq!(pid_file.read(), Some(std::process::id() as i32));
    }

    #[tokio::test]
    async fn kill_without_pid_file_reports_not_running() {
        let dir = tempdir().unwrap();
        let err = kill_daemon(&dir.path().join("daemon.pid")).await.unwrap_err();
        assert!(matches!(err, DevtrackError::NotRunning));
    }

    #[tokio::test]
    async fn kill_with_stale_pid_reports_not_running_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("daemon.pid");
        std::fs::write(&path, "999999999").unwrap();

        let err = kill_daemon(&path).await.unwrap_err();
        assert!(matches!(err, DevtrackError::NotRunning));
        assert!(!path.exists(), "PID file removed on every exit path");
    }

    #[test]
    fn tail_log_slices_last_lines() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("daemon.log");
        std::fs::write(&log, "one\ntwo\nthree\nfour\n").unwrap();

        assert_eq!(tail_log(&log, 2).unwrap(), vec!["three", "four"]);
        assert_eq!(tail_log(&log, 10).unwrap().len(), 4);
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(120)), "2m");
        assert_eq!(format_uptime(Duration::from_secs(3_720)), "1h 2m");
        assert_eq!(format_uptime(Duration::from_secs(90_060)), "1d 1h 1m");
    }
}
