// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `devtrack status`: daemon state as a table or JSON.
//!
//! Works entirely from the profile directory (PID file, log mtime, event
//! store, config), so it needs neither a repository nor a live daemon and
//! never exits non-zero for "daemon stopped".

use std::io::IsTerminal;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use devtrack_core::ProfileDir;
use devtrack_daemon::{
    format_uptime, next_aligned, uptime_from_log, work_hours_status_now, PidFile, SchedulerConfig,
    PAUSED_KEY,
};
use devtrack_storage::EventStore;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub running: bool,
    pub pid: Option<i32>,
    pub uptime_secs: Option<u64>,
    pub uptime_human: Option<String>,
    pub trigger_count: Option<i64>,
    pub last_trigger: Option<DateTime<Utc>>,
    pub paused: Option<bool>,
    pub interval_minutes: u32,
    pub next_trigger: Option<DateTime<Local>>,
    pub work_hours_enabled: bool,
    pub work_hours_open: bool,
    pub config_path: String,
    pub log_path: String,
    pub pid_path: String,
    pub database_path: String,
    pub socket_path: String,
}

/// Run the `status` subcommand. Always exits 0.
pub async fn run_status(profile: &ProfileDir, json: bool, plain: bool) -> i32 {
    let report = gather(profile).await;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_table(&report, use_color);
    }
    0
}

async fn gather(profile: &ProfileDir) -> StatusReport {
    // A broken config must not break `status`; fall back to defaults.
    let config = devtrack_config::load(profile).unwrap_or_default();
    let scheduler_config = SchedulerConfig::from(&config.settings);

    let pid = PidFile::new(profile.pid_path()).live_pid();
    let running = pid.is_some();

    let uptime = running
        .then(|| uptime_from_log(&profile.log_path()))
        .flatten();

    // Store-derived figures; only touch the database if it already exists.
    let (trigger_count, last_trigger, paused) = if profile.db_path().exists() {
        match EventStore::open(profile.db_path()).await {
            Ok(store) => {
                let count = store.stats().await.ok().map(|s| s.triggers);
                let last = store
                    .get_recent_triggers(1)
                    .await
                    .ok()
                    .and_then(|mut rows| rows.pop())
                    .map(|t| t.timestamp);
                let paused = store
                    .get_config(PAUSED_KEY)
                    .await
                    .ok()
                    .flatten()
                    .map(|v| v == "true");
                store.close().await.ok();
                (count, last, paused)
            }
            Err(_) => (None, None, None),
        }
    } else {
        (None, None, None)
    };

    let work_hours = work_hours_status_now(&scheduler_config);
    let next_trigger =
        running.then(|| next_aligned(Local::now(), scheduler_config.interval_minutes));

    StatusReport {
        running,
        pid,
        uptime_secs: uptime.map(|u| u.as_secs()),
        uptime_human: uptime.map(format_uptime),
        trigger_count,
        last_trigger,
        paused,
        interval_minutes: scheduler_config.interval_minutes,
        next_trigger,
        work_hours_enabled: work_hours.enabled,
        work_hours_open: work_hours.is_work_hours,
        config_path: profile.config_path().display().to_string(),
        log_path: profile.log_path().display().to_string(),
        pid_path: profile.pid_path().display().to_string(),
        database_path: profile.db_path().display().to_string(),
        socket_path: profile.socket_path().display().to_string(),
    }
}

fn print_table(report: &StatusReport, use_color: bool) {
    println!();
    println!("  DevTrack daemon status");
    println!("  {}", "─".repeat(40));

    if report.running {
        let state = if use_color {
            use colored::Colorize;
            format!("{} running", "✓".green())
        } else {
            "[OK] running".to_string()
        };
        let pid = report.pid.unwrap_or_default();
        match &report.uptime_human {
            Some(uptime) => println!("    State:      {state} (PID {pid}, uptime {uptime})"),
            None => println!("    State:      {state} (PID {pid})"),
        }

        if let Some(count) = report.trigger_count {
            match report.last_trigger {
                Some(last) => println!(
                    "    Triggers:   {count} (last at {})",
                    last.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                ),
                None => println!("    Triggers:   {count}"),
            }
        }

        let paused = matches!(report.paused, Some(true));
        let cadence = if paused { "paused" } else { "active" };
        match report.next_trigger {
            Some(next) => {
                let remaining = (next - Local::now()).num_minutes().max(0);
                println!(
                    "    Scheduler:  {cadence}, every {}m, next at {} (in {remaining}m)",
                    report.interval_minutes,
                    next.format("%H:%M")
                );
            }
            None => println!("    Scheduler:  {cadence}, every {}m", report.interval_minutes),
        }
    } else {
        let state = if use_color {
            use colored::Colorize;
            format!("{} stopped", "✗".red())
        } else {
            "[--] stopped".to_string()
        };
        println!("    State:      {state}");
    }

    if report.work_hours_enabled {
        let gate = if report.work_hours_open { "open" } else { "closed" };
        println!("    Work hours: enabled ({gate})");
    } else {
        println!("    Work hours: disabled");
    }

    println!();
    println!("  Paths:");
    println!("    Config:   {}", report.config_path);
    println!("    Log:      {}", report.log_path);
    println!("    PID file: {}", report.pid_path);
    println!("    Database: {}", report.database_path);
    println!("    Socket:   {}", report.socket_path);

    if !report.running {
        println!();
        println!("  Start with: devtrack start");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn status_without_daemon_or_database() {
        let dir = tempdir().unwrap();
        let profile = ProfileDir::at(dir.path());

        let report = gather(&profile).await;
        assert!(!report.running);
        assert!(report.pid.is_none());
        assert!(report.trigger_count.is_none());
        assert_eq!(report.interval_minutes, 180);
        assert!(report.config_path.ends_with("config.yaml"));
        // Gathering status must not create the database as a side effect.
        assert!(!profile.db_path().exists());
    }

    #[tokio::test]
    async fn status_report_serializes() {
        let dir = tempdir().unwrap();
        let report = gather(&ProfileDir::at(dir.path())).await;
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"running\":false"));
    }
}
