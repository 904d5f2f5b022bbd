//! Tracking operations: the only transitions that change recorded time.
//!
//! The ledger's state machine is the running pointer:
//!
//! ```text
//!            start                       stop
//!   idle  ──────────▶  running(day, id)  ──────────▶  idle
//! ```
//!
//! `add_work_unit` and `add_compensatory_unit` record closed units and leave
//! the pointer alone. Every operation checks all of its preconditions before it
//! mutates anything, so a failed call leaves the ledger as it was.

use chrono::{NaiveDate, TimeDelta};
use thiserror::Error;

use crate::balance::{DayBalance, apply_compensatory, apply_work};
use crate::day::{Day, Timestamp, Unit, UnitId, UnitKind};
use crate::ledger::{Ledger, RunningUnit};
use crate::policy::WorkingHoursPolicy;

/// Why a tracking operation was refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackingError {
    #[error("time is in the future")]
    TimeInFuture,

    #[error("a unit of work is already running")]
    UnitAlreadyRunning,

    #[error("no unit of work is running")]
    NoUnitRunning,

    #[error("stop time is before start time")]
    StopBeforeStart,

    #[error("time falls within an already completed unit")]
    TimeWithinCompletedUnit,

    #[error("compensatory time is only allowed on regular work days")]
    CompensationOnNonWorkDay,

    /// The running pointer refers to a unit that does not exist or is stopped.
    #[error("running unit {unit} on {day} cannot be found")]
    DanglingRunningUnit { day: NaiveDate, unit: UnitId },

    #[error("{day} already has tracked units")]
    DayAlreadyTracked { day: NaiveDate },
}

impl Ledger {
    /// Starts a work unit at `time`, or at `now` when no time is given.
    pub fn start(
        &mut self,
        time: Option<Timestamp>,
        comment: impl Into<String>,
        now: Timestamp,
    ) -> Result<UnitId, TrackingError> {
        let start = time.unwrap_or(now);
        if start > now {
            return Err(TrackingError::TimeInFuture);
        }
        if self.is_running() {
            return Err(TrackingError::UnitAlreadyRunning);
        }
        let date = start.date_naive();
        if self.day(date).is_some_and(|day| day.collides_with(start)) {
            return Err(TrackingError::TimeWithinCompletedUnit);
        }

        let id = UnitId::new();
        self.day_entry(date)
            .insert_unit(id, Unit::running(start, comment.into()));
        self.set_running(Some(RunningUnit { day: date, unit: id }));
        tracing::debug!(%date, unit = %id, %start, "started unit");
        Ok(id)
    }

    /// Stops the running unit at `time`, or at `now` when no time is given,
    /// and folds its duration into the day it was started on.
    pub fn stop(
        &mut self,
        time: Option<Timestamp>,
        policy: &WorkingHoursPolicy,
        now: Timestamp,
    ) -> Result<(), TrackingError> {
        let running = self.running().ok_or(TrackingError::NoUnitRunning)?;
        let stop = time.unwrap_or(now);
        if stop < self.resolve(running)?.start() {
            return Err(TrackingError::StopBeforeStart);
        }

        let dangling = TrackingError::DanglingRunningUnit {
            day: running.day,
            unit: running.unit,
        };
        let day = self.day_mut(running.day).ok_or_else(|| dangling.clone())?;
        let worked = day.complete_unit(running.unit, stop).ok_or(dangling)?;
        apply_to_day(day, UnitKind::Work, worked, policy);
        self.set_running(None);
        tracing::debug!(date = %running.day, unit = %running.unit, %stop, "stopped unit");
        Ok(())
    }

    /// Records a closed work unit from `start` to `stop`.
    pub fn add_work_unit(
        &mut self,
        start: Timestamp,
        stop: Timestamp,
        comment: impl Into<String>,
        policy: &WorkingHoursPolicy,
    ) -> Result<UnitId, TrackingError> {
        self.add_completed(start, stop, UnitKind::Work, comment.into(), policy)
    }

    /// Records compensatory time from `start` to `stop`, reducing the day's balance.
    ///
    /// Only regular work days accept compensatory time.
    pub fn add_compensatory_unit(
        &mut self,
        start: Timestamp,
        stop: Timestamp,
        comment: impl Into<String>,
        policy: &WorkingHoursPolicy,
    ) -> Result<UnitId, TrackingError> {
        self.add_completed(start, stop, UnitKind::Compensatory, comment.into(), policy)
    }

    fn add_completed(
        &mut self,
        start: Timestamp,
        stop: Timestamp,
        kind: UnitKind,
        comment: String,
        policy: &WorkingHoursPolicy,
    ) -> Result<UnitId, TrackingError> {
        if start > stop {
            return Err(TrackingError::StopBeforeStart);
        }
        let date = start.date_naive();
        if kind == UnitKind::Compensatory {
            let non_work_day = self
                .day(date)
                .map_or_else(|| Day::new(date).is_non_work_day(), Day::is_non_work_day);
            if non_work_day {
                return Err(TrackingError::CompensationOnNonWorkDay);
            }
        }
        if self
            .day(date)
            .is_some_and(|day| day.collides_with(start) || day.collides_with(stop))
        {
            return Err(TrackingError::TimeWithinCompletedUnit);
        }

        let id = UnitId::new();
        let unit = Unit::completed(start, stop, kind, comment);
        let day = self.day_entry(date);
        day.insert_unit(id, unit);
        apply_to_day(day, kind, stop - start, policy);
        tracing::debug!(%date, unit = %id, %kind, %start, %stop, "added unit");
        Ok(id)
    }
}

fn apply_to_day(day: &mut Day, kind: UnitKind, duration: TimeDelta, policy: &WorkingHoursPolicy) {
    let balance: DayBalance = day.initialize_balance();
    let updated = match kind {
        UnitKind::Work => apply_work(day, balance, duration, policy),
        UnitKind::Compensatory => apply_compensatory(balance, duration, policy),
    };
    day.set_balance(updated);
}
