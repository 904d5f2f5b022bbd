//! Working-hours policy used to compute overtime.

use chrono::{NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::duration::TrackedDuration;

/// Nominal working hours against which overtime is measured.
///
/// Only `enabled` and `work_day` influence the ledger. The remaining fields
/// describe the usual working day and are kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkingHoursPolicy {
    /// Whether overtime is computed at all.
    pub enabled: bool,
    /// Usual start of the work day.
    pub start_time: NaiveTime,
    /// Usual end of the work day.
    pub end_time: NaiveTime,
    /// Usual lunch break.
    pub lunch_break: TrackedDuration,
    /// Nominal hours of a work day.
    pub work_day: TrackedDuration,
    /// Nominal hours of a work week.
    pub work_week: TrackedDuration,
}

impl WorkingHoursPolicy {
    /// A policy that tracks totals but leaves overtime untouched.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Nominal hours of a work day.
    #[must_use]
    pub const fn work_day(&self) -> TimeDelta {
        self.work_day.get()
    }

    /// Nominal hours of a work week.
    #[must_use]
    pub const fn work_week(&self) -> TimeDelta {
        self.work_week.get()
    }
}

impl Default for WorkingHoursPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            lunch_break: TrackedDuration::new(TimeDelta::hours(1)),
            work_day: TrackedDuration::new(TimeDelta::hours(8)),
            work_week: TrackedDuration::new(TimeDelta::hours(40)),
        }
    }
}
