//! Human-readable durations as stored in the ledger file.
//!
//! Durations use the `72h3m0.5s` notation: hours, minutes and seconds with a
//! fractional part, falling back to `ms`/`µs`/`ns` below one second. This keeps
//! the ledger readable and compatible with files written by earlier versions.

use std::fmt;
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Errors produced when parsing a duration string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    /// The string is not a sequence of `<number><unit>` pairs.
    #[error("invalid duration: {input:?}")]
    Invalid { input: String },

    /// A number was not followed by a unit.
    #[error("missing unit in duration: {input:?}")]
    MissingUnit { input: String },

    /// A unit other than `h`, `m`, `s`, `ms`, `us`/`µs` or `ns` was used.
    #[error("unknown unit {unit:?} in duration: {input:?}")]
    UnknownUnit { unit: String, input: String },

    /// The value does not fit into a duration.
    #[error("duration out of range: {input:?}")]
    OutOfRange { input: String },
}

/// A signed duration that serializes as a human-readable string.
///
/// Totals and overtime can be negative, so the sign is part of the value
/// (`-4h0m0s`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackedDuration(TimeDelta);

impl TrackedDuration {
    /// A zero-length duration.
    pub const ZERO: Self = Self(TimeDelta::zero());

    /// Wraps a [`TimeDelta`].
    #[must_use]
    pub const fn new(delta: TimeDelta) -> Self {
        Self(delta)
    }

    /// Returns the inner [`TimeDelta`].
    #[must_use]
    pub const fn get(self) -> TimeDelta {
        self.0
    }
}

impl From<TimeDelta> for TrackedDuration {
    fn from(delta: TimeDelta) -> Self {
        Self(delta)
    }
}

impl From<TrackedDuration> for TimeDelta {
    fn from(duration: TrackedDuration) -> Self {
        duration.0
    }
}

impl fmt::Display for TrackedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_duration(self.0))
    }
}

impl FromStr for TrackedDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s).map(Self)
    }
}

impl Serialize for TrackedDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TrackedDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

fn total_nanos(delta: TimeDelta) -> i128 {
    i128::from(delta.num_seconds()) * NANOS_PER_SECOND + i128::from(delta.subsec_nanos())
}

/// Splits `value` at `precision` decimal digits, returning the trimmed fraction
/// (with its leading dot, or empty) and the integer part.
fn split_fraction(value: u128, precision: u32) -> (String, u128) {
    let divisor = 10_u128.pow(precision);
    let fraction = value % divisor;
    let integer = value / divisor;
    if fraction == 0 {
        return (String::new(), integer);
    }
    let digits = format!("{fraction:0width$}", width = precision as usize);
    (format!(".{}", digits.trim_end_matches('0')), integer)
}

/// Formats a duration as `1h2m3.5s`, `4m0s`, `250ms` or `0s`.
pub fn format_duration(delta: TimeDelta) -> String {
    let nanos = total_nanos(delta);
    if nanos == 0 {
        return "0s".to_string();
    }
    let magnitude = nanos.unsigned_abs();
    let sign = if nanos < 0 { "-" } else { "" };

    if magnitude < NANOS_PER_SECOND.unsigned_abs() {
        let (unit, precision) = if magnitude < 1_000 {
            ("ns", 0)
        } else if magnitude < 1_000_000 {
            ("µs", 3)
        } else {
            ("ms", 6)
        };
        let (fraction, integer) = split_fraction(magnitude, precision);
        return format!("{sign}{integer}{fraction}{unit}");
    }

    let (fraction, total_seconds) = split_fraction(magnitude, 9);
    let seconds = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let mut out = String::from(sign);
    if total_minutes > 0 {
        let hours = total_minutes / 60;
        if hours > 0 {
            out.push_str(&format!("{hours}h"));
        }
        out.push_str(&format!("{}m", total_minutes % 60));
    }
    out.push_str(&format!("{seconds}{fraction}s"));
    out
}

fn unit_scale(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(3_600 * NANOS_PER_SECOND),
        _ => None,
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parses durations such as `8h`, `-4h0m0s`, `1.5h` or `90m`.
///
/// A bare `0` is accepted; every other component needs a unit.
pub fn parse_duration(input: &str) -> Result<TimeDelta, DurationParseError> {
    let invalid = || DurationParseError::Invalid {
        input: input.to_string(),
    };
    let out_of_range = || DurationParseError::OutOfRange {
        input: input.to_string(),
    };

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if rest == "0" {
        return Ok(TimeDelta::zero());
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos: i128 = 0;
    while !rest.is_empty() {
        let (whole, after_whole) = split_digits(rest);
        let (fraction, after_number) = match after_whole.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", after_whole),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }

        let unit_end = after_number
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(after_number.len());
        let (unit, remainder) = after_number.split_at(unit_end);
        if unit.is_empty() {
            return Err(DurationParseError::MissingUnit {
                input: input.to_string(),
            });
        }
        let scale = unit_scale(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let whole_value: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| out_of_range())?
        };
        let mut component = whole_value.checked_mul(scale).ok_or_else(out_of_range)?;
        if !fraction.is_empty() {
            // Digits beyond nanosecond resolution of an hour are irrelevant.
            let significant = &fraction[..fraction.len().min(18)];
            let digits: i128 = significant.parse().map_err(|_| invalid())?;
            let divisor = 10_i128.pow(u32::try_from(significant.len()).map_err(|_| invalid())?);
            component += digits * scale / divisor;
        }
        nanos = nanos.checked_add(component).ok_or_else(out_of_range)?;
        rest = remainder;
    }

    if negative {
        nanos = -nanos;
    }
    let seconds =
        i64::try_from(nanos.div_euclid(NANOS_PER_SECOND)).map_err(|_| out_of_range())?;
    let subsec = u32::try_from(nanos.rem_euclid(NANOS_PER_SECOND)).map_err(|_| out_of_range())?;
    TimeDelta::new(seconds, subsec).ok_or_else(out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_hours_with_zero_minutes_and_seconds() {
        assert_eq!(format_duration(TimeDelta::hours(4)), "4h0m0s");
        assert_eq!(format_duration(TimeDelta::hours(-4)), "-4h0m0s");
    }

    #[test]
    fn formats_mixed_components() {
        let delta = TimeDelta::hours(2) + TimeDelta::minutes(30);
        assert_eq!(format_duration(delta), "2h30m0s");
        assert_eq!(format_duration(TimeDelta::minutes(30)), "30m0s");
        assert_eq!(format_duration(TimeDelta::seconds(42)), "42s");
        assert_eq!(format_duration(TimeDelta::milliseconds(1_500)), "1.5s");
    }

    #[test]
    fn formats_sub_second_units() {
        assert_eq!(format_duration(TimeDelta::zero()), "0s");
        assert_eq!(format_duration(TimeDelta::milliseconds(250)), "250ms");
        assert_eq!(format_duration(TimeDelta::microseconds(1_500)), "1.5ms");
        assert_eq!(format_duration(TimeDelta::microseconds(3)), "3µs");
        assert_eq!(format_duration(TimeDelta::nanoseconds(7)), "7ns");
    }

    #[test]
    fn parses_formatted_values() {
        assert_eq!(parse_duration("4h0m0s").unwrap(), TimeDelta::hours(4));
        assert_eq!(parse_duration("-4h0m0s").unwrap(), TimeDelta::hours(-4));
        assert_eq!(
            parse_duration("2h30m0s").unwrap(),
            TimeDelta::minutes(150)
        );
        assert_eq!(parse_duration("250ms").unwrap(), TimeDelta::milliseconds(250));
        assert_eq!(parse_duration("3µs").unwrap(), TimeDelta::microseconds(3));
        assert_eq!(parse_duration("0").unwrap(), TimeDelta::zero());
    }

    #[test]
    fn parses_fractions_and_shorthand() {
        assert_eq!(parse_duration("1.5h").unwrap(), TimeDelta::minutes(90));
        assert_eq!(parse_duration(".5s").unwrap(), TimeDelta::milliseconds(500));
        assert_eq!(parse_duration("8h").unwrap(), TimeDelta::hours(8));
        assert_eq!(parse_duration("-1m30s").unwrap(), TimeDelta::seconds(-90));
    }

    #[test]
    fn negative_sub_second_values_keep_their_sign() {
        let delta = parse_duration("-1.5s").unwrap();
        assert_eq!(delta, TimeDelta::milliseconds(-1_500));
        assert_eq!(format_duration(delta), "-1.5s");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            parse_duration(""),
            Err(DurationParseError::Invalid { .. })
        ));
        assert!(matches!(
            parse_duration("12"),
            Err(DurationParseError::MissingUnit { .. })
        ));
        assert!(matches!(
            parse_duration("3d"),
            Err(DurationParseError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("h"),
            Err(DurationParseError::Invalid { .. })
        ));
    }

    #[test]
    fn tracked_duration_serializes_as_string() {
        let duration = TrackedDuration::new(TimeDelta::hours(-4));
        let json = serde_json::to_string(&duration).unwrap();
        assert_eq!(json, "\"-4h0m0s\"");
        let parsed: TrackedDuration = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, duration);
    }

    #[test]
    fn tracked_duration_rejects_non_duration_strings() {
        let result: Result<TrackedDuration, _> = serde_json::from_str("\"soon\"");
        assert!(result.is_err());
    }
}
