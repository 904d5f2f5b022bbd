//! Core domain logic for the aeon time tracker.
//!
//! This crate contains the ledger engine:
//! - Days: calendar records seeded with ISO week, weekday and weekend flag
//! - Balance: incremental totals and overtime against a working-hours policy
//! - Ledger: all days plus the single running unit
//! - Tracking: start, stop and back-filled work or compensatory units
//!
//! The ledger is a plain value. It is not synchronized; callers that share it
//! between processes must serialize the load, operate, save cycle themselves.

pub mod balance;
pub mod day;
pub mod duration;
pub mod holiday;
mod ledger;
pub mod policy;
mod tracking;

pub use balance::DayBalance;
pub use day::{Day, Timestamp, Unit, UnitId, UnitKind};
pub use duration::{DurationParseError, TrackedDuration, format_duration, parse_duration};
pub use holiday::{Holiday, HolidayCalendar};
pub use ledger::{Ledger, LedgerError, RunningUnit};
pub use policy::WorkingHoursPolicy;
pub use tracking::TrackingError;
