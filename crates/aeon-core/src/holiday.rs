//! Public holidays used to seed a year's ledger.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A public holiday on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// Display name, possibly several localized names joined by `", "`.
    pub name: String,
    /// Subdivision codes (e.g. `DE-BY`) the holiday is limited to.
    /// Empty for nationwide holidays.
    #[serde(default)]
    pub regions: Vec<String>,
}

impl Holiday {
    /// Whether the holiday is observed in `region`.
    ///
    /// Without a region every holiday applies.
    pub fn applies_to(&self, region: Option<&str>) -> bool {
        match region {
            None => true,
            Some(region) => {
                self.regions.is_empty()
                    || self.regions.iter().any(|r| r.eq_ignore_ascii_case(region))
            }
        }
    }

    /// Folds another holiday on the same date into this one.
    ///
    /// Names are joined with `", "`. The result is nationwide if either side is.
    fn merge(&mut self, other: Self) {
        if self.name != other.name && !self.name.split(", ").any(|name| name == other.name) {
            self.name = format!("{}, {}", self.name, other.name);
        }
        if self.regions.is_empty() || other.regions.is_empty() {
            self.regions.clear();
        } else {
            for region in other.regions {
                if !self.regions.contains(&region) {
                    self.regions.push(region);
                }
            }
        }
    }
}

/// Holidays keyed by date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    days: BTreeMap<NaiveDate, Holiday>,
}

impl HolidayCalendar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a holiday, merging it with one already on the same date.
    pub fn insert(&mut self, date: NaiveDate, holiday: Holiday) {
        match self.days.entry(date) {
            Entry::Vacant(entry) => {
                entry.insert(holiday);
            }
            Entry::Occupied(mut entry) => entry.get_mut().merge(holiday),
        }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&Holiday> {
        self.days.get(&date)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &Holiday)> {
        self.days.iter().map(|(date, holiday)| (*date, holiday))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl FromIterator<(NaiveDate, Holiday)> for HolidayCalendar {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, Holiday)>>(iter: I) -> Self {
        let mut calendar = Self::new();
        for (date, holiday) in iter {
            calendar.insert(date, holiday);
        }
        calendar
    }
}
