//! The ledger: every tracked day plus the pointer to the running unit.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::day::{Day, Unit, UnitId};
use crate::holiday::HolidayCalendar;
use crate::tracking::TrackingError;

/// Structural problems found in a loaded ledger.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The year cannot be represented as a calendar year.
    #[error("year {0} is out of range")]
    InvalidYear(i32),

    #[error("{day}: ISO week number {week} is out of range")]
    WeekOutOfRange { day: NaiveDate, week: u32 },

    #[error("{day}: ISO weekday {weekday} is out of range")]
    WeekdayOutOfRange { day: NaiveDate, weekday: u32 },

    #[error("{day} is marked as a public holiday but has no name")]
    UnnamedHoliday { day: NaiveDate },

    /// A unit has a stop without a duration or the other way round.
    #[error("unit {unit} on {day} has inconsistent stop and duration")]
    InconsistentUnit { day: NaiveDate, unit: UnitId },

    #[error("more than one unit is running: {first} and {second}")]
    MultipleRunning { first: UnitId, second: UnitId },

    /// A unit is open but the ledger does not point at it.
    #[error("unit {unit} on {day} is open but not marked as running")]
    UntrackedRunning { day: NaiveDate, unit: UnitId },

    /// The running pointer does not resolve to an open unit.
    #[error("running unit {unit} on {day} does not exist or is already stopped")]
    DanglingRunning { day: NaiveDate, unit: UnitId },
}

/// Location of the unit that is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningUnit {
    #[serde(rename = "DayKey")]
    pub day: NaiveDate,
    #[serde(rename = "UnitID")]
    pub unit: UnitId,
}

/// All tracked days and the single running unit, if any.
///
/// Recorded time only changes through [`Ledger::start`], [`Ledger::stop`],
/// [`Ledger::add_work_unit`] and [`Ledger::add_compensatory_unit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(rename = "aeon_days")]
    days: BTreeMap<NaiveDate, Day>,
    #[serde(
        rename = "current_running_unit",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    running: Option<RunningUnit>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a ledger holding every date of `year`, with public holidays marked.
    pub fn for_year(year: i32, holidays: &HolidayCalendar) -> Result<Self, LedgerError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(LedgerError::InvalidYear(year))?;
        let mut days: BTreeMap<NaiveDate, Day> = first
            .iter_days()
            .take_while(|date| date.year() == year)
            .map(|date| (date, Day::new(date)))
            .collect();

        for (date, holiday) in holidays.iter() {
            if let Some(day) = days.get_mut(&date) {
                day.mark_public_holiday(holiday.name.clone());
            }
        }

        let ledger = Self {
            days,
            running: None,
        };
        ledger.validate()?;
        tracing::info!(year, days = ledger.days.len(), holidays = holidays.len(), "created ledger");
        Ok(ledger)
    }

    pub const fn days(&self) -> &BTreeMap<NaiveDate, Day> {
        &self.days
    }

    pub fn day(&self, date: NaiveDate) -> Option<&Day> {
        self.days.get(&date)
    }

    /// Whether a unit is currently running.
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The running unit and where it lives.
    ///
    /// Fails with [`TrackingError::DanglingRunningUnit`] if the pointer does not
    /// resolve to an open unit.
    pub fn running_unit(&self) -> Result<Option<(RunningUnit, &Unit)>, TrackingError> {
        let Some(running) = self.running else {
            return Ok(None);
        };
        self.resolve(running).map(|unit| Some((running, unit)))
    }

    /// Marks `date` as a vacation day.
    ///
    /// Totals are folded in incrementally, so a day that already has units cannot
    /// change its nature afterwards.
    pub fn mark_vacation(&mut self, date: NaiveDate) -> Result<(), TrackingError> {
        if self.day(date).is_some_and(|day| !day.units().is_empty()) {
            return Err(TrackingError::DayAlreadyTracked { day: date });
        }
        self.day_entry(date).mark_vacation();
        tracing::debug!(%date, "marked vacation day");
        Ok(())
    }

    /// Checks the invariants a deserialized ledger cannot express in its types.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let mut open: Option<(NaiveDate, UnitId)> = None;

        for (&date, day) in &self.days {
            if !(1..=53).contains(&day.iso_week_number()) {
                return Err(LedgerError::WeekOutOfRange {
                    day: date,
                    week: day.iso_week_number(),
                });
            }
            if !(1..=7).contains(&day.iso_weekday()) {
                return Err(LedgerError::WeekdayOutOfRange {
                    day: date,
                    weekday: day.iso_weekday(),
                });
            }
            if day.is_public_holiday() && day.public_holiday_name().is_none_or(str::is_empty) {
                return Err(LedgerError::UnnamedHoliday { day: date });
            }

            for (&id, unit) in day.units() {
                if !unit.is_consistent() {
                    return Err(LedgerError::InconsistentUnit { day: date, unit: id });
                }
                if unit.is_running() {
                    if let Some((_, first)) = open {
                        return Err(LedgerError::MultipleRunning { first, second: id });
                    }
                    open = Some((date, id));
                }
            }
        }

        match (self.running, open) {
            (None, None) => Ok(()),
            (Some(running), Some((day, unit))) if running.day == day && running.unit == unit => {
                Ok(())
            }
            (Some(running), _) => Err(LedgerError::DanglingRunning {
                day: running.day,
                unit: running.unit,
            }),
            (None, Some((day, unit))) => Err(LedgerError::UntrackedRunning { day, unit }),
        }
    }

    pub(crate) fn resolve(&self, running: RunningUnit) -> Result<&Unit, TrackingError> {
        self.days
            .get(&running.day)
            .and_then(|day| day.unit(running.unit))
            .filter(|unit| unit.is_running())
            .ok_or(TrackingError::DanglingRunningUnit {
                day: running.day,
                unit: running.unit,
            })
    }

    pub(crate) const fn running(&self) -> Option<RunningUnit> {
        self.running
    }

    pub(crate) const fn set_running(&mut self, running: Option<RunningUnit>) {
        self.running = running;
    }

    pub(crate) fn day_mut(&mut self, date: NaiveDate) -> Option<&mut Day> {
        self.days.get_mut(&date)
    }

    /// Returns the day for `date`, creating it on first use.
    pub(crate) fn day_entry(&mut self, date: NaiveDate) -> &mut Day {
        self.days.entry(date).or_insert_with(|| Day::new(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, TimeDelta};

    use crate::day::Timestamp;
    use crate::holiday::Holiday;
    use crate::policy::WorkingHoursPolicy;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn at(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn calendar() -> HolidayCalendar {
        [(
            date("2020-05-01"),
            Holiday {
                name: "Tag der Arbeit".to_string(),
                regions: Vec::new(),
            },
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn for_year_contains_every_date() {
        let ledger = Ledger::for_year(2020, &HolidayCalendar::new()).unwrap();
        assert_eq!(ledger.days().len(), 366);
        assert!(ledger.day(date("2020-01-01")).is_some());
        assert!(ledger.day(date("2020-12-31")).is_some());
        assert!(ledger.day(date("2021-01-01")).is_none());
        assert!(!ledger.is_running());
    }

    #[test]
    fn for_year_marks_holidays() {
        let ledger = Ledger::for_year(2020, &calendar()).unwrap();
        let may_day = ledger.day(date("2020-05-01")).unwrap();
        assert!(may_day.is_public_holiday());
        assert_eq!(may_day.public_holiday_name(), Some("Tag der Arbeit"));
        assert!(!ledger.day(date("2020-05-04")).unwrap().is_public_holiday());
        ledger.validate().unwrap();
    }

    #[test]
    fn for_year_rejects_unnamed_holiday() {
        let holidays: HolidayCalendar = [(
            date("2020-01-01"),
            Holiday {
                name: String::new(),
                regions: Vec::new(),
            },
        )]
        .into_iter()
        .collect();
        let err = Ledger::for_year(2020, &holidays).unwrap_err();
        assert_eq!(
            err,
            LedgerError::UnnamedHoliday {
                day: date("2020-01-01")
            }
        );
    }

    #[test]
    fn for_year_ignores_holidays_outside_the_year() {
        let mut holidays = calendar();
        holidays.insert(
            date("2021-01-01"),
            Holiday {
                name: "Neujahr".to_string(),
                regions: Vec::new(),
            },
        );
        let ledger = Ledger::for_year(2020, &holidays).unwrap();
        assert!(ledger.day(date("2021-01-01")).is_none());
    }

    #[test]
    fn mark_vacation_creates_missing_day() {
        let mut ledger = Ledger::new();
        ledger.mark_vacation(date("2020-02-05")).unwrap();
        let day = ledger.day(date("2020-02-05")).unwrap();
        assert!(day.is_vacation_day());
        assert!(day.is_non_work_day());
    }

    #[test]
    fn mark_vacation_rejects_tracked_day() {
        let mut ledger = Ledger::new();
        ledger
            .add_work_unit(
                at("2020-02-05T09:00:00Z"),
                at("2020-02-05T10:00:00Z"),
                "",
                &WorkingHoursPolicy::default(),
            )
            .unwrap();
        let err = ledger.mark_vacation(date("2020-02-05")).unwrap_err();
        assert_eq!(
            err,
            TrackingError::DayAlreadyTracked {
                day: date("2020-02-05")
            }
        );
        assert!(!ledger.day(date("2020-02-05")).unwrap().is_vacation_day());
    }

    #[test]
    fn running_unit_resolves_pointer() {
        let now = at("2020-02-05T17:00:00Z");
        let mut ledger = Ledger::new();
        let id = ledger
            .start(Some(at("2020-02-05T13:00:00Z")), "", now)
            .unwrap();
        let (running, unit) = ledger.running_unit().unwrap().unwrap();
        assert_eq!(running.unit, id);
        assert_eq!(running.day, date("2020-02-05"));
        assert_eq!(unit.start(), at("2020-02-05T13:00:00Z"));
    }

    #[test]
    fn dangling_pointer_is_reported() {
        let mut ledger = Ledger::new();
        let missing = RunningUnit {
            day: date("2020-02-05"),
            unit: UnitId::new(),
        };
        ledger.set_running(Some(missing));
        assert_eq!(
            ledger.running_unit().unwrap_err(),
            TrackingError::DanglingRunningUnit {
                day: missing.day,
                unit: missing.unit,
            }
        );
        assert_eq!(
            ledger.validate().unwrap_err(),
            LedgerError::DanglingRunning {
                day: missing.day,
                unit: missing.unit,
            }
        );
    }

    #[test]
    fn validate_rejects_open_unit_without_pointer() {
        let json = r#"{
            "aeon_days": {
                "2020-02-05": {
                    "iso_week_number": 6,
                    "iso_week_day": 3,
                    "public_holiday": false,
                    "vacation_day": false,
                    "week_end": false,
                    "units": {
                        "0b5f4d9e-3a3c-4a53-9df1-3c1c5f0f2a10": {
                            "start": "2020-02-05T13:00:00Z",
                            "type": "WORK"
                        }
                    }
                }
            }
        }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();
        assert!(matches!(
            ledger.validate(),
            Err(LedgerError::UntrackedRunning { .. })
        ));
    }

    #[test]
    fn validate_rejects_stop_without_duration() {
        let json = r#"{
            "aeon_days": {
                "2020-02-05": {
                    "iso_week_number": 6,
                    "iso_week_day": 3,
                    "public_holiday": false,
                    "vacation_day": false,
                    "week_end": false,
                    "units": {
                        "0b5f4d9e-3a3c-4a53-9df1-3c1c5f0f2a10": {
                            "start": "2020-02-05T13:00:00Z",
                            "stop": "2020-02-05T14:00:00Z",
                            "type": "WORK"
                        }
                    }
                }
            }
        }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();
        assert!(matches!(
            ledger.validate(),
            Err(LedgerError::InconsistentUnit { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_calendar_fields() {
        let json = r#"{
            "aeon_days": {
                "2020-02-05": {
                    "iso_week_number": 54,
                    "iso_week_day": 3,
                    "public_holiday": false,
                    "vacation_day": false,
                    "week_end": false
                }
            }
        }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();
        assert!(matches!(
            ledger.validate(),
            Err(LedgerError::WeekOutOfRange { week: 54, .. })
        ));

        let json = r#"{
            "aeon_days": {
                "2020-05-01": {
                    "iso_week_number": 18,
                    "iso_week_day": 5,
                    "public_holiday": true,
                    "vacation_day": false,
                    "week_end": false
                }
            }
        }"#;
        let ledger: Ledger = serde_json::from_str(json).unwrap();
        assert!(matches!(
            ledger.validate(),
            Err(LedgerError::UnnamedHoliday { .. })
        ));
    }

    #[test]
    fn serde_roundtrip_preserves_days_units_and_pointer() {
        let policy = WorkingHoursPolicy::default();
        let now = at("2020-02-06T12:00:00Z");
        let mut ledger = Ledger::for_year(2020, &calendar()).unwrap();
        ledger
            .add_work_unit(
                at("2020-02-05T09:00:00Z"),
                at("2020-02-05T12:30:00Z"),
                "review",
                &policy,
            )
            .unwrap();
        let running = ledger
            .start(Some(at("2020-02-06T08:00:00Z")), "deploy", now)
            .unwrap();

        let json = serde_json::to_string_pretty(&ledger).unwrap();
        let restored: Ledger = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, ledger);
        restored.validate().unwrap();
        let (pointer, _) = restored.running_unit().unwrap().unwrap();
        assert_eq!(pointer.unit, running);
        assert_eq!(
            restored.day(date("2020-02-05")).unwrap().total_hours(),
            Some(TimeDelta::minutes(210))
        );
    }

    #[test]
    fn serde_roundtrip_without_running_unit() {
        let mut ledger = Ledger::new();
        ledger
            .add_work_unit(
                at("2020-02-05T09:00:00Z"),
                at("2020-02-05T10:00:00Z"),
                "",
                &WorkingHoursPolicy::default(),
            )
            .unwrap();
        let json = serde_json::to_value(&ledger).unwrap();
        assert!(json.get("current_running_unit").is_none());
        let restored: Ledger = serde_json::from_value(json).unwrap();
        assert_eq!(restored, ledger);
        assert!(!restored.is_running());
    }
}
