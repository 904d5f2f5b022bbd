//! Days and the units of time recorded on them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balance::DayBalance;
use crate::duration::TrackedDuration;

/// An instant together with the UTC offset it was recorded in.
///
/// The offset decides which calendar day a unit belongs to.
pub type Timestamp = DateTime<FixedOffset>;

/// Identifier of a unit within the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(Uuid);

impl UnitId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UnitId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What a unit of time counts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitKind {
    /// Time worked; adds to the day's total.
    Work,
    /// Time off in lieu of earlier overtime; subtracts from the day's total.
    Compensatory,
}

impl UnitKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Work => "WORK",
            Self::Compensatory => "COMPENSATORY",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One interval of tracked time.
///
/// A unit without `stop` is running. `duration` is present exactly when `stop`
/// is; [`Ledger::validate`](crate::Ledger::validate) rejects files that break
/// this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    start: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stop: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<TrackedDuration>,
    #[serde(rename = "type")]
    kind: UnitKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    comment: String,
}

impl Unit {
    /// Creates an open work unit.
    pub(crate) fn running(start: Timestamp, comment: String) -> Self {
        Self {
            start,
            stop: None,
            duration: None,
            kind: UnitKind::Work,
            comment,
        }
    }

    /// Creates a closed unit. The caller guarantees `start <= stop`.
    pub(crate) fn completed(
        start: Timestamp,
        stop: Timestamp,
        kind: UnitKind,
        comment: String,
    ) -> Self {
        Self {
            start,
            stop: Some(stop),
            duration: Some(TrackedDuration::new(stop - start)),
            kind,
            comment,
        }
    }

    pub const fn start(&self) -> Timestamp {
        self.start
    }

    pub const fn stop(&self) -> Option<Timestamp> {
        self.stop
    }

    pub fn duration(&self) -> Option<TimeDelta> {
        self.duration.map(TrackedDuration::get)
    }

    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub const fn is_running(&self) -> bool {
        self.stop.is_none()
    }

    /// Whether `stop` and `duration` are either both set or both absent.
    pub(crate) const fn is_consistent(&self) -> bool {
        self.stop.is_some() == self.duration.is_some()
    }

    /// Returns true if `time` lies strictly inside this completed unit.
    ///
    /// Touching either boundary does not count, so back-to-back units are fine.
    /// Running units never contain anything.
    pub fn contains(&self, time: Timestamp) -> bool {
        self.stop.is_some_and(|stop| self.start < time && time < stop)
    }

    /// Closes the unit and returns its duration.
    fn complete(&mut self, stop: Timestamp) -> TimeDelta {
        let duration = stop - self.start;
        self.stop = Some(stop);
        self.duration = Some(TrackedDuration::new(duration));
        duration
    }
}

/// The tracking record of one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    iso_week_number: u32,
    #[serde(rename = "iso_week_day")]
    iso_weekday: u32,
    public_holiday: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    public_holiday_name: Option<String>,
    vacation_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_hours: Option<TrackedDuration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    overtime_hours: Option<TrackedDuration>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    units: BTreeMap<UnitId, Unit>,
    #[serde(rename = "week_end")]
    weekend: bool,
}

impl Day {
    /// Seeds an empty record for `date`.
    ///
    /// ISO week, weekday (Monday = 1 … Sunday = 7) and the weekend flag are
    /// fixed here and never recomputed.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        let iso_weekday = date.weekday().number_from_monday();
        Self {
            iso_week_number: date.iso_week().week(),
            iso_weekday,
            public_holiday: false,
            public_holiday_name: None,
            vacation_day: false,
            total_hours: None,
            overtime_hours: None,
            units: BTreeMap::new(),
            weekend: iso_weekday >= 6,
        }
    }

    pub const fn iso_week_number(&self) -> u32 {
        self.iso_week_number
    }

    pub const fn iso_weekday(&self) -> u32 {
        self.iso_weekday
    }

    pub const fn is_weekend(&self) -> bool {
        self.weekend
    }

    pub const fn is_public_holiday(&self) -> bool {
        self.public_holiday
    }

    pub fn public_holiday_name(&self) -> Option<&str> {
        self.public_holiday_name.as_deref()
    }

    pub const fn is_vacation_day(&self) -> bool {
        self.vacation_day
    }

    /// Vacation days, public holidays and weekends.
    pub const fn is_non_work_day(&self) -> bool {
        self.vacation_day || self.public_holiday || self.weekend
    }

    /// Sum of completed work minus compensatory time, if anything was recorded.
    pub fn total_hours(&self) -> Option<TimeDelta> {
        self.total_hours.map(TrackedDuration::get)
    }

    /// Overtime (negative when short of the work day), if anything was recorded.
    pub fn overtime_hours(&self) -> Option<TimeDelta> {
        self.overtime_hours.map(TrackedDuration::get)
    }

    pub const fn units(&self) -> &BTreeMap<UnitId, Unit> {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    /// Whether `time` falls strictly inside any completed unit of this day.
    pub fn collides_with(&self, time: Timestamp) -> bool {
        self.units.values().any(|unit| unit.contains(time))
    }

    pub(crate) fn mark_public_holiday(&mut self, name: impl Into<String>) {
        self.public_holiday = true;
        self.public_holiday_name = Some(name.into());
    }

    pub(crate) const fn mark_vacation(&mut self) {
        self.vacation_day = true;
    }

    pub(crate) fn insert_unit(&mut self, id: UnitId, unit: Unit) {
        self.units.insert(id, unit);
    }

    /// Closes a running unit, returning its duration.
    pub(crate) fn complete_unit(&mut self, id: UnitId, stop: Timestamp) -> Option<TimeDelta> {
        self.units
            .get_mut(&id)
            .filter(|unit| unit.is_running())
            .map(|unit| unit.complete(stop))
    }

    /// Turns absent totals into explicit zeros and returns the current balance.
    pub(crate) fn initialize_balance(&mut self) -> DayBalance {
        let total = *self.total_hours.get_or_insert(TrackedDuration::ZERO);
        let overtime = *self.overtime_hours.get_or_insert(TrackedDuration::ZERO);
        DayBalance {
            total: total.get(),
            overtime: overtime.get(),
        }
    }

    pub(crate) const fn set_balance(&mut self, balance: DayBalance) {
        self.total_hours = Some(TrackedDuration::new(balance.total));
        self.overtime_hours = Some(TrackedDuration::new(balance.overtime));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn at(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn new_day_derives_iso_week_and_weekday() {
        let day = Day::new(date("2020-02-05"));
        assert_eq!(day.iso_week_number(), 6);
        assert_eq!(day.iso_weekday(), 3);
        assert!(!day.is_weekend());
        assert!(day.units().is_empty());
        assert_eq!(day.total_hours(), None);
        assert_eq!(day.overtime_hours(), None);
    }

    #[test]
    fn sunday_is_weekday_seven() {
        let day = Day::new(date("2020-02-09"));
        assert_eq!(day.iso_weekday(), 7);
        assert!(day.is_weekend());
        assert!(day.is_non_work_day());

        let saturday = Day::new(date("2020-02-08"));
        assert_eq!(saturday.iso_weekday(), 6);
        assert!(saturday.is_weekend());
    }

    #[test]
    fn new_year_can_belong_to_previous_iso_year() {
        let day = Day::new(date("2021-01-01"));
        assert_eq!(day.iso_week_number(), 53);
        assert_eq!(day.iso_weekday(), 5);
    }

    #[test]
    fn contains_uses_open_interval() {
        let unit = Unit::completed(
            at("2020-02-05T09:00:00Z"),
            at("2020-02-05T12:00:00Z"),
            UnitKind::Work,
            String::new(),
        );
        assert!(unit.contains(at("2020-02-05T10:00:00Z")));
        assert!(!unit.contains(at("2020-02-05T09:00:00Z")));
        assert!(!unit.contains(at("2020-02-05T12:00:00Z")));
        assert!(!unit.contains(at("2020-02-05T13:00:00Z")));
    }

    #[test]
    fn running_unit_contains_nothing() {
        let unit = Unit::running(at("2020-02-05T09:00:00Z"), String::new());
        assert!(!unit.contains(at("2020-02-05T10:00:00Z")));
        assert!(unit.is_running());
        assert!(unit.is_consistent());
    }

    #[test]
    fn initialize_balance_distinguishes_untouched_from_zero() {
        let mut day = Day::new(date("2020-02-05"));
        assert_eq!(day.total_hours(), None);
        let balance = day.initialize_balance();
        assert_eq!(balance, DayBalance::default());
        assert_eq!(day.total_hours(), Some(TimeDelta::zero()));
        assert_eq!(day.overtime_hours(), Some(TimeDelta::zero()));
    }

    #[test]
    fn unit_serializes_with_type_tag_and_duration_string() {
        let unit = Unit::completed(
            at("2020-02-05T13:00:00Z"),
            at("2020-02-05T17:00:00Z"),
            UnitKind::Compensatory,
            "dentist".to_string(),
        );
        let json = serde_json::to_value(&unit).unwrap();
        assert_eq!(json["type"], "COMPENSATORY");
        assert_eq!(json["duration"], "4h0m0s");
        assert_eq!(json["comment"], "dentist");
    }

    #[test]
    fn running_unit_omits_stop_and_duration() {
        let unit = Unit::running(at("2020-02-05T13:00:00Z"), String::new());
        let json = serde_json::to_value(&unit).unwrap();
        assert!(json.get("stop").is_none());
        assert!(json.get("duration").is_none());
        assert!(json.get("comment").is_none());
    }

    #[test]
    fn unit_id_parses_from_display() {
        let id = UnitId::new();
        let parsed: UnitId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
