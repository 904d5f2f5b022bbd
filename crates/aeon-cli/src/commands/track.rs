//! Tracking commands: start, stop, add and comp.
//!
//! Each function applies one ledger operation and returns the confirmation
//! line to print once the ledger has been saved.

use aeon_core::{Ledger, Timestamp, UnitKind, WorkingHoursPolicy};
use anyhow::Result;
use chrono::{DateTime, TimeZone};

use super::util::{format_clock, parse_time};

/// Starts a unit at `time`, or now.
pub fn start<Tz: TimeZone>(
    ledger: &mut Ledger,
    time: Option<&str>,
    comment: &str,
    now: &DateTime<Tz>,
) -> Result<String> {
    let time = time.map(|t| parse_time(t, now)).transpose()?;
    let now = now.fixed_offset();
    ledger.start(time, comment, now)?;
    Ok(format!(
        "Started at {}.",
        describe(time.unwrap_or(now), now)
    ))
}

/// Stops the running unit at `time`, or now.
pub fn stop<Tz: TimeZone>(
    ledger: &mut Ledger,
    time: Option<&str>,
    policy: &WorkingHoursPolicy,
    now: &DateTime<Tz>,
) -> Result<String> {
    let time = time.map(|t| parse_time(t, now)).transpose()?;
    let now = now.fixed_offset();
    ledger.stop(time, policy, now)?;
    Ok(format!(
        "Stopped at {}.",
        describe(time.unwrap_or(now), now)
    ))
}

/// Records a completed unit of `kind` from `start` to `stop`.
pub fn add<Tz: TimeZone>(
    ledger: &mut Ledger,
    kind: UnitKind,
    start: &str,
    stop: &str,
    comment: &str,
    policy: &WorkingHoursPolicy,
    now: &DateTime<Tz>,
) -> Result<String> {
    let start = parse_time(start, now)?;
    let stop = parse_time(stop, now)?;
    match kind {
        UnitKind::Work => ledger.add_work_unit(start, stop, comment, policy)?,
        UnitKind::Compensatory => ledger.add_compensatory_unit(start, stop, comment, policy)?,
    };

    let date = start.date_naive();
    let label = match kind {
        UnitKind::Work => "work",
        UnitKind::Compensatory => "compensatory time",
    };
    let mut message = format!(
        "Added {} of {label} on {date}.",
        format_clock(stop - start)
    );
    if let Some(day) = ledger.day(date) {
        let total = day.total_hours().unwrap_or_default();
        let overtime = day.overtime_hours().unwrap_or_default();
        message.push_str(&format!(
            " Day total {}, overtime {}.",
            format_clock(total),
            format_clock(overtime)
        ));
    }
    Ok(message)
}

/// Renders `time` as a clock time, with the date when it is not today.
fn describe(time: Timestamp, now: Timestamp) -> String {
    let local = time.with_timezone(&now.timezone());
    if local.date_naive() == now.date_naive() {
        local.format("%H:%M:%S").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aeon_core::TrackingError;
    use chrono::{FixedOffset, NaiveDate, TimeDelta};

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2020-02-05T17:00:00+01:00").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn start_and_stop_with_clock_times() {
        let policy = WorkingHoursPolicy::default();
        let mut ledger = Ledger::new();

        let message = start(&mut ledger, Some("13:00"), "", &now()).unwrap();
        assert_eq!(message, "Started at 13:00:00.");
        assert!(ledger.is_running());

        let message = stop(&mut ledger, None, &policy, &now()).unwrap();
        assert_eq!(message, "Stopped at 17:00:00.");
        assert!(!ledger.is_running());

        let day = ledger.day(date("2020-02-05")).unwrap();
        assert_eq!(day.total_hours(), Some(TimeDelta::hours(4)));
        assert_eq!(day.overtime_hours(), Some(TimeDelta::hours(-4)));
    }

    #[test]
    fn start_on_other_day_mentions_date() {
        let mut ledger = Ledger::new();
        let message = start(&mut ledger, Some("2020-02-04T09:00:00"), "", &now()).unwrap();
        assert_eq!(message, "Started at 2020-02-04 09:00:00.");
    }

    #[test]
    fn start_rejects_future_and_unparsable_times() {
        let mut ledger = Ledger::new();
        let err = start(&mut ledger, Some("18:00"), "", &now()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TrackingError>(),
            Some(&TrackingError::TimeInFuture)
        );
        assert!(start(&mut ledger, Some("soon"), "", &now()).is_err());
        assert!(!ledger.is_running());
    }

    #[test]
    fn stop_without_running_unit_fails() {
        let mut ledger = Ledger::new();
        let err = stop(&mut ledger, None, &WorkingHoursPolicy::default(), &now()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TrackingError>(),
            Some(&TrackingError::NoUnitRunning)
        );
    }

    #[test]
    fn add_reports_day_balance() {
        let policy = WorkingHoursPolicy::default();
        let mut ledger = Ledger::new();
        let message = add(
            &mut ledger,
            UnitKind::Work,
            "09:00",
            "13:30",
            "review",
            &policy,
            &now(),
        )
        .unwrap();
        assert_eq!(
            message,
            "Added 04:30:00 of work on 2020-02-05. Day total 04:30:00, overtime -03:30:00."
        );

        let message = add(
            &mut ledger,
            UnitKind::Compensatory,
            "14:00",
            "15:00",
            "",
            &policy,
            &now(),
        )
        .unwrap();
        assert_eq!(
            message,
            "Added 01:00:00 of compensatory time on 2020-02-05. Day total 03:30:00, overtime -04:30:00."
        );
    }

    #[test]
    fn comp_on_weekend_fails() {
        let mut ledger = Ledger::new();
        let err = add(
            &mut ledger,
            UnitKind::Compensatory,
            "2020-02-08T09:00:00",
            "2020-02-08T10:00:00",
            "",
            &WorkingHoursPolicy::default(),
            &now(),
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<TrackingError>(),
            Some(&TrackingError::CompensationOnNonWorkDay)
        );
        assert!(ledger.day(date("2020-02-08")).is_none());
    }
}
