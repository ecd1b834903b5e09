//! Weekday/time-of-day scheduling of check cycles.
//!
//! The loop is single-threaded: a cycle always finishes before the next fire
//! time is computed, so cycles never overlap.

use chrono::{Datelike, Duration, Local, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::check::{run_signal_check, CheckContext};
use crate::history::{CheckHistory, HistoryEntry};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid schedule: {0}")]
    Invalid(String),

    #[error("schedule has no future fire time after {0}")]
    NoFireTime(NaiveDateTime),
}

/// Fire at `hour:minute` local time on each listed weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSchedule {
    pub weekdays: Vec<Weekday>,
    pub hour: u32,
    pub minute: u32,
    /// A fire picked up later than this many seconds is skipped.
    pub misfire_grace_secs: u64,
}

impl Default for CheckSchedule {
    fn default() -> Self {
        Self {
            weekdays: vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            hour: 7,
            minute: 0,
            misfire_grace_secs: 900,
        }
    }
}

impl CheckSchedule {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.weekdays.is_empty() {
            return Err(ScheduleError::Invalid("at least one weekday is required".into()));
        }
        if self.hour > 23 {
            return Err(ScheduleError::Invalid(format!("hour {} is out of range 0-23", self.hour)));
        }
        if self.minute > 59 {
            return Err(ScheduleError::Invalid(format!("minute {} is out of range 0-59", self.minute)));
        }
        Ok(())
    }

    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        (0..=7)
            .filter_map(|offset| now.date().checked_add_signed(Duration::days(offset)))
            .filter(|date| self.weekdays.contains(&date.weekday()))
            .filter_map(|date| date.and_hms_opt(self.hour, self.minute, 0))
            .find(|fire| *fire > now)
    }

    pub fn misfire_grace(&self) -> Duration {
        Duration::seconds(i64::try_from(self.misfire_grace_secs).unwrap_or(i64::MAX))
    }
}

/// Time source for the scheduling loop.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn sleep_until(&self, deadline: NaiveDateTime);
}

/// Wall clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep_until(&self, deadline: NaiveDateTime) {
        if let Ok(wait) = (deadline - self.now()).to_std() {
            std::thread::sleep(wait);
        }
    }
}

/// Tally of a [`run_scheduled`] session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub completed: usize,
    pub failed: usize,
    pub misfired: usize,
}

impl ScheduleSummary {
    pub fn cycles(&self) -> usize {
        self.completed + self.failed + self.misfired
    }
}

/// Run checks on `schedule` until `max_cycles` fire times have passed
/// (forever when `None`).
///
/// A failed check is logged and the loop continues. Completed checks are
/// appended to `history` when one is given.
pub fn run_scheduled(
    ctx: &CheckContext<'_>,
    schedule: &CheckSchedule,
    clock: &dyn Clock,
    history: Option<&CheckHistory>,
    max_cycles: Option<usize>,
) -> Result<ScheduleSummary, ScheduleError> {
    schedule.validate()?;
    let grace = schedule.misfire_grace();
    let mut summary = ScheduleSummary::default();

    while max_cycles.map_or(true, |max| summary.cycles() < max) {
        let now = clock.now();
        let fire = schedule.next_after(now).ok_or(ScheduleError::NoFireTime(now))?;
        tracing::info!(next = %fire, "waiting for next check");
        clock.sleep_until(fire);

        let lateness = clock.now() - fire;
        if lateness > grace {
            tracing::warn!(
                fire = %fire,
                late_secs = lateness.num_seconds(),
                "check skipped: misfire grace exceeded"
            );
            summary.misfired += 1;
            continue;
        }

        match run_signal_check(ctx, fire.date(), clock.now().date()) {
            Ok(outcome) => {
                summary.completed += 1;
                if let Some(history) = history {
                    if let Err(e) = history.append(&HistoryEntry::from_outcome(&outcome)) {
                        tracing::error!(path = %history.path().display(), error = %e, "failed to append check history");
                    }
                }
            }
            Err(e) => {
                summary.failed += 1;
                tracing::error!(date = %fire.date(), error = %e, "check failed");
            }
        }
    }

    Ok(summary)
}
