// SPDX-FileCopyrightText: 2026 DevTrack Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interval scheduler with pause/resume/skip/force and a work-hours gate.
//!
//! Firings are wall-clock aligned: the next firing is the next instant whose
//! minutes-since-midnight is a multiple of the interval, at second zero.
//! Fired events go through a bounded channel to a single consumer, so
//! callbacks never overlap and a hung callback blocks later firings.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike, Utc};
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use devtrack_config::model::Settings;
use devtrack_core::{DevtrackError, TimerTick, TriggerEvent};

/// Scheduler knobs derived from the settings section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval_minutes: u32,
    pub work_hours_only: bool,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
}

impl From<&Settings> for SchedulerConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            interval_minutes: settings.prompt_interval.max(1),
            work_hours_only: settings.work_hours_only,
            work_start_hour: settings.work_start_hour,
            work_end_hour: settings.work_end_hour,
        }
    }
}

/// Read-only snapshot of scheduler state.
#[derive(Debug, Clone)]
pub struct SchedulerStats {
    pub paused: bool,
    pub trigger_count: u64,
    pub last_trigger: Option<DateTime<Local>>,
    pub next_trigger: Option<DateTime<Local>>,
    pub interval_minutes: u32,
}

/// Current state of the work-hours gate.
#[derive(Debug, Clone)]
pub struct WorkHoursStatus {
    pub enabled: bool,
    pub current_hour: u32,
    pub work_start_hour: u32,
    pub work_end_hour: u32,
    pub is_work_hours: bool,
    /// When the gate next opens, if it is currently closed.
    pub next_work_start: Option<DateTime<Local>>,
}

struct State {
    config: SchedulerConfig,
    paused: bool,
    trigger_count: u64,
    last_trigger: Option<DateTime<Local>>,
    next_trigger: Option<DateTime<Local>>,
    /// Aligned instant to skip, from `skip_next`. Cleared once passed.
    skip_until: Option<DateTime<Local>>,
}

/// Interval-driven timer emitting [`TriggerEvent::Timer`] events.
pub struct Scheduler {
    state: Arc<Mutex<State>>,
    events_tx: mpsc::Sender<TriggerEvent>,
    reschedule: Arc<Notify>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, events_tx: mpsc::Sender<TriggerEvent>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                config,
                paused: false,
                trigger_count: 0,
                last_trigger: None,
                next_trigger: None,
                skip_until: None,
            })),
            events_tx,
            reschedule: Arc::new(Notify::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the tick loop.
    pub fn start(&self) -> Result<(), DevtrackError> {
        let interval = self.lock().config.interval_minutes;
        if interval < 1 {
            return Err(DevtrackError::Config(
                "scheduler interval must be at least 1 minute".to_string(),
            ));
        }
        info!(interval_minutes = interval, "scheduler started");

        let state = self.state.clone();
        let events_tx = self.events_tx.clone();
        let reschedule = self.reschedule.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            loop {
                let next = {
                    let mut st = state.lock().expect("scheduler state lock poisoned");
                    let now = Local::now();
                    let mut next = next_aligned(now, st.config.interval_minutes);
                    let skip = st.skip_until;
                    match skip {
                        Some(skip) if next <= skip => {
                            next += Duration::minutes(i64::from(st.config.interval_minutes));
                        }
                        Some(skip) if now > skip => st.skip_until = None,
                        _ => {}
                    }
                    st.next_trigger = Some(next);
                    next
                };

                let wait = (next - Local::now())
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);

                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("scheduler stopped");
                        return;
                    }
                    _ = reschedule.notified() => continue,
                    _ = tokio::time::sleep(wait) => {
                        let event = {
                            let mut st =
                                state.lock().expect("scheduler state lock poisoned");
                            gated_fire(&mut st)
                        };
                        if let Some(event) = event {
                            // Bounded channel: a slow or hung consumer blocks
                            // the cadence rather than piling firings up.
                            if events_tx.send(event).await.is_err() {
                                error!("trigger channel closed, scheduler exiting");
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(())
    }

    /// Stop the tick loop at its next suspension point.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Suppress firings. Idempotent; `next_trigger` keeps advancing.
    pub fn pause(&self) {
        let mut st = self.lock();
        if st.paused {
            debug!("scheduler is already paused");
            return;
        }
        st.paused = true;
        info!("scheduler paused");
    }

    /// Resume firings and recompute `next_trigger` relative to now.
    pub fn resume(&self) {
        {
            let mut st = self.lock();
            if !st.paused {
                debug!("scheduler is not paused");
                return;
            }
            st.paused = false;
        }
        self.reschedule.notify_waiters();
        info!("scheduler resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Replace the schedule atomically. Pause state is preserved.
    pub fn set_interval(&self, minutes: u32) -> Result<(), DevtrackError> {
        if minutes < 1 {
            return Err(DevtrackError::Config(
                "interval must be at least 1 minute".to_string(),
            ));
        }
        self.lock().config.interval_minutes = minutes;
        self.reschedule.notify_waiters();
        info!(interval_minutes = minutes, "scheduler interval updated");
        Ok(())
    }

    /// Apply reloaded settings (interval and work-hours gate) in one step.
    pub fn apply_settings(&self, config: SchedulerConfig) {
        self.lock().config = config;
        self.reschedule.notify_waiters();
        info!("scheduler settings reloaded");
    }

    /// Fire once, out of band: bypasses pause and the work-hours gate and
    /// does not advance the regular cadence. An explicit operator command.
    pub async fn force_immediate(&self) -> Result<(), DevtrackError> {
        let event = {
            let mut st = self.lock();
            st.trigger_count += 1;
            st.last_trigger = Some(Local::now());
            TriggerEvent::Timer {
                at: Utc::now(),
                tick: TimerTick {
                    count: st.trigger_count,
                    interval_minutes: st.config.interval_minutes,
                },
            }
        };
        info!("forcing immediate trigger");
        self.events_tx
            .send(event)
            .await
            .map_err(|_| DevtrackError::SchedulerUnavailable)
    }

    /// Push the next firing forward by exactly one interval.
    pub fn skip_next(&self) {
        {
            let mut st = self.lock();
            let next = next_aligned(Local::now(), st.config.interval_minutes);
            st.skip_until = Some(next);
        }
        self.reschedule.notify_waiters();
        info!("skipping next scheduled trigger");
    }

    pub fn stats(&self) -> SchedulerStats {
        let st = self.lock();
        SchedulerStats {
            paused: st.paused,
            trigger_count: st.trigger_count,
            last_trigger: st.last_trigger,
            next_trigger: st.next_trigger,
            interval_minutes: st.config.interval_minutes,
        }
    }

    pub fn work_hours_status(&self) -> WorkHoursStatus {
        let config = self.lock().config;
        work_hours_status_at(Local::now(), &config)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("scheduler state lock poisoned")
    }
}

/// Apply the pause and work-hours gates; build the event if both are open.
fn gated_fire(st: &mut State) -> Option<TriggerEvent> {
    if st.paused {
        debug!("trigger skipped (scheduler is paused)");
        return None;
    }
    let now = Local::now();
    if st.config.work_hours_only && !gate_open(now.hour(), &st.config) {
        info!(
            work_start_hour = st.config.work_start_hour,
            work_end_hour = st.config.work_end_hour,
            "trigger skipped (outside work hours)"
        );
        return None;
    }

    st.trigger_count += 1;
    st.last_trigger = Some(now);
    debug!(count = st.trigger_count, "timer trigger");
    Some(TriggerEvent::Timer {
        at: Utc::now(),
        tick: TimerTick {
            count: st.trigger_count,
            interval_minutes: st.config.interval_minutes,
        },
    })
}

/// Whether `hour` falls inside `[work_start_hour, work_end_hour)`.
fn gate_open(hour: u32, config: &SchedulerConfig) -> bool {
    hour >= config.work_start_hour && hour < config.work_end_hour
}

/// The next instant strictly after `now` whose minutes-since-midnight is a
/// multiple of `interval_minutes`, at second zero.
pub fn next_aligned(now: DateTime<Local>, interval_minutes: u32) -> DateTime<Local> {
    let interval = interval_minutes.max(1);
    let minutes_of_day = now.hour() * 60 + now.minute();
    let next_slot = (minutes_of_day / interval + 1) * interval;

    if next_slot >= 24 * 60 {
        // Midnight is slot zero of the next day, which is always aligned.
        let tomorrow = now.date_naive() + Duration::days(1);
        at_slot(tomorrow, 0).unwrap_or(now + Duration::minutes(i64::from(interval)))
    } else {
        at_slot(now.date_naive(), next_slot)
            .unwrap_or(now + Duration::minutes(i64::from(interval)))
    }
}

fn at_slot(date: NaiveDate, slot: u32) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(slot / 60, slot % 60, 0)?;
    Local.from_local_datetime(&naive).earliest()
}

/// Gate state right now, computed from a config alone. The control surface
/// uses this to report work-hours state without a live scheduler.
pub fn work_hours_status_now(config: &SchedulerConfig) -> WorkHoursStatus {
    work_hours_status_at(Local::now(), config)
}

/// Gate state at a given instant; pure for testability.
fn work_hours_status_at(now: DateTime<Local>, config: &SchedulerConfig) -> WorkHoursStatus {
    let current_hour = now.hour();
    let is_work_hours = !config.work_hours_only || gate_open(current_hour, config);

    let next_work_start = (!is_work_hours).then(|| {
        let date = if current_hour < config.work_start_hour {
            now.date_naive()
        } else {
            // Past today's window; the gate reopens tomorrow morning.
            now.date_naive() + Duration::days(1)
        };
        at_slot(date, config.work_start_hour * 60).unwrap_or(now)
    });

    WorkHoursStatus {
        enabled: config.work_hours_only,
        current_hour,
        work_start_hour: config.work_start_hour,
        work_end_hour: config.work_end_hour,
        is_work_hours,
        next_work_start,
    }
}
