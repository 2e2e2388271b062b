//! Periodic sweeps as explicit timers.
//!
//! A [`Scheduler`] owns one [`Interval`] per sweep. Nothing runs on its own:
//! a driver loop calls [`Scheduler::tick`] whenever it wakes up, and every
//! sweep whose deadline has passed runs once against the store.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use log::debug;

use crate::config::TimerConfig;
use crate::store::{Notifier, TaskStore};

/// A fixed-period timer. Disarmed until started.
#[derive(Debug, Clone)]
pub struct Interval {
    period: TimeDelta,
    next: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn new(period: TimeDelta) -> Self {
        Self { period, next: None }
    }

    /// Arm the timer so it first fires one period after `now`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next
    }

    /// Returns true if the timer is due at `now`, and re-arms it. Missed
    /// periods collapse into a single firing.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let Some(due) = self.next else {
            return false;
        };
        if now < due {
            return false;
        }
        let following = due + self.period;
        self.next = Some(if following > now {
            following
        } else {
            now + self.period
        });
        true
    }
}

/// What one scheduler tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub reminded: usize,
    pub purged: usize,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.reminded == 0 && self.purged == 0
    }
}

pub struct Scheduler {
    reminders: Interval,
    retention: Interval,
    retention_window: TimeDelta,
}

impl Scheduler {
    pub fn new(timers: &TimerConfig) -> Self {
        Self {
            reminders: Interval::new(timers.reminder_interval()),
            retention: Interval::new(timers.retention_sweep()),
            retention_window: timers.retention_window(),
        }
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.reminders.start(now);
        self.retention.start(now);
        debug!("timers started at {now}");
    }

    pub fn stop(&mut self) {
        self.reminders.stop();
        self.retention.stop();
        debug!("timers stopped");
    }

    pub fn is_running(&self) -> bool {
        self.reminders.is_running() || self.retention.is_running()
    }

    /// Earliest armed deadline, if any timer is running.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.reminders.next_due(), self.retention.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// How long a driver may sleep before the next deadline.
    pub fn until_next(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.next_deadline()
            .map(|at| (at - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Run every sweep that is due at the store's current time.
    pub fn tick(&mut self, store: &mut TaskStore, notifier: &mut dyn Notifier) -> Result<TickReport> {
        let now = store.now();
        let mut report = TickReport::default();
        if self.reminders.poll(now) {
            report.reminded = store.check_reminders(notifier)?;
        }
        if self.retention.poll(now) {
            report.purged = store.purge_expired(self.retention_window)?;
        }
        Ok(report)
    }
}
