// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daemon internals: the interval scheduler, the integrated monitor that
//! fans commit and timer events into persistence + publication, and the
//! supervisor primitives (PID file, signals, forced termination).

pub mod monitor;
pub mod scheduler;
pub mod shutdown;
pub mod supervisor;

pub use monitor::{IntegratedMonitor, PAUSED_KEY};
pub use scheduler::{
    next_aligned, work_hours_status_now, Scheduler, SchedulerConfig, SchedulerStats,
    WorkHoursStatus,
};
pub use shutdown::install_signal_handler;
pub use supervisor::{
    acquire_instance_lock, format_uptime, kill_daemon, process_alive, tail_log, uptime_from_log,
    PidFile,
};
