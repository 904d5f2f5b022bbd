//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use aeon_core::Timestamp;
use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day)s?\s+ago$").expect("relative time pattern is valid")
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parses a TIME argument relative to `now`.
///
/// Supports:
/// - RFC 3339: "2024-03-04T09:00:00+01:00"
/// - Local date and time: "2024-03-04T09:00:00"
/// - Local time today: "09:00" or "09:00:30"
/// - Relative: "20 minutes ago", "2 hours ago", "1 day ago"
///
/// Local times are resolved in `now`'s time zone. Times skipped by a DST
/// change are rejected; ambiguous ones take the earlier instant.
pub fn parse_time<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> anyhow::Result<Timestamp> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return resolve_local(naive, now);
    }
    if let Some(time) = parse_clock(input) {
        return resolve_local(now.date_naive().and_time(time), now);
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(input) else {
        anyhow::bail!(
            "Invalid time: {input}. Use RFC 3339, YYYY-MM-DDTHH:MM:SS, HH:MM or relative (e.g., '20 minutes ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now.fixed_offset() - TimeDelta::minutes(n * minutes_per_unit))
}

fn parse_clock(input: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(input, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M"))
        .ok()
}

fn resolve_local<Tz: TimeZone>(
    naive: NaiveDateTime,
    now: &DateTime<Tz>,
) -> anyhow::Result<Timestamp> {
    now.timezone()
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .with_context(|| format!("{naive} does not exist in the local time zone"))
}

/// Formats a duration as `HH:MM:SS`, rounded to the nearest second.
///
/// Negative durations get a leading `-`. Hours are not wrapped at 24.
pub fn format_clock(delta: TimeDelta) -> String {
    let sign = if delta < TimeDelta::zero() { "-" } else { "" };
    let rounded = delta.abs() + TimeDelta::milliseconds(500);
    let seconds = rounded.num_seconds();
    format!(
        "{sign}{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds / 60 % 60,
        seconds % 60
    )
}

/// Name of the local IANA time zone, or `UTC` if it cannot be determined.
pub fn local_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}
