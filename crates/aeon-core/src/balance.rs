//! Incremental day totals and overtime.
//!
//! The ledger never recomputes a day from its units. Each completed unit is
//! folded into the running balance with one of the functions below.

use chrono::TimeDelta;

use crate::day::Day;
use crate::policy::WorkingHoursPolicy;

/// A day's total hours and overtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayBalance {
    pub total: TimeDelta,
    pub overtime: TimeDelta,
}

/// Adds worked time to a day's balance.
///
/// With the policy disabled overtime is carried over untouched. On vacation
/// days, public holidays and weekends every hour is overtime; otherwise the
/// nominal work day is subtracted. Overtime is never clamped at zero.
pub fn apply_work(
    day: &Day,
    balance: DayBalance,
    worked: TimeDelta,
    policy: &WorkingHoursPolicy,
) -> DayBalance {
    let total = balance.total + worked;
    let overtime = if !policy.enabled {
        balance.overtime
    } else if day.is_non_work_day() {
        total
    } else {
        total - policy.work_day()
    };
    DayBalance { total, overtime }
}

/// Subtracts compensatory time from a day's balance.
///
/// Compensatory units are only accepted on regular work days, so there is no
/// non-work-day case here.
pub fn apply_compensatory(
    balance: DayBalance,
    taken: TimeDelta,
    policy: &WorkingHoursPolicy,
) -> DayBalance {
    let total = balance.total - taken;
    let overtime = if policy.enabled {
        total - policy.work_day()
    } else {
        balance.overtime
    };
    DayBalance { total, overtime }
}
