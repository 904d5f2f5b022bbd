//! Report command for today's units and the quarterly overview.
//!
//! This module implements `aeon report` (and the bare `aeon` invocation) with
//! two views, today and `--quarter`, each available as text or JSON.
//! Durations render as signed `HH:MM:SS`.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;

use aeon_core::balance::apply_work;
use aeon_core::{DayBalance, Ledger, Timestamp, UnitKind, WorkingHoursPolicy};
use anyhow::{Context, Result};
use chrono::{Datelike, FixedOffset, Months, NaiveDate, TimeDelta};
use serde::{Serialize, Serializer};

use super::util::{format_clock, local_timezone};

/// How many days ahead, today included, public holidays are announced.
const HOLIDAY_LOOKAHEAD_DAYS: usize = 7;

/// Months before the current one covered by the quarterly report.
const QUARTER_PAST_MONTHS: u32 = 2;

// ========== Today ==========

/// One unit of today's report. Times are in the report's offset.
#[derive(Debug, Clone, Serialize)]
pub struct ReportUnit {
    #[serde(serialize_with = "serialize_time")]
    pub start: Timestamp,
    /// Stop time, or the report time for the running unit.
    #[serde(serialize_with = "serialize_time")]
    pub stop: Timestamp,
    #[serde(serialize_with = "serialize_clock")]
    pub duration: TimeDelta,
    #[serde(rename = "type")]
    pub kind: UnitKind,
    pub running: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

/// A public holiday within the lookahead window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpcomingHoliday {
    pub date: NaiveDate,
    pub name: String,
}

/// Computed report for the current day.
#[derive(Debug, Clone, Serialize)]
pub struct TodayReport {
    pub date: NaiveDate,
    pub timezone: String,
    pub units: Vec<ReportUnit>,
    /// Whether anything has been recorded today.
    pub tracked: bool,
    /// Recorded total plus the running unit's elapsed time.
    #[serde(serialize_with = "serialize_clock")]
    pub total: TimeDelta,
    /// Overtime as it would stand if the running unit stopped now.
    #[serde(serialize_with = "serialize_clock")]
    pub overtime: TimeDelta,
    pub holidays: Vec<UpcomingHoliday>,
}

/// Builds today's report as of `now`.
///
/// A running unit on today's date counts up to `now`, and its elapsed time is
/// folded into the balance the same way stopping it would.
pub fn today_report(
    ledger: &Ledger,
    policy: &WorkingHoursPolicy,
    now: Timestamp,
    timezone: impl Into<String>,
) -> TodayReport {
    let date = now.date_naive();
    let offset = now.timezone();
    let day = ledger.day(date);

    let mut units = Vec::new();
    let mut elapsed = TimeDelta::zero();
    let mut balance = DayBalance::default();

    if let Some(day) = day {
        for unit in day.units().values() {
            let (stop, duration, running) = match (unit.stop(), unit.duration()) {
                (Some(stop), Some(duration)) => (stop, duration, false),
                _ => {
                    let running_for = now - unit.start();
                    elapsed += running_for;
                    (now, running_for, true)
                }
            };
            units.push(ReportUnit {
                start: unit.start().with_timezone(&offset),
                stop: stop.with_timezone(&offset),
                duration,
                kind: unit.kind(),
                running,
                comment: unit.comment().to_string(),
            });
        }
        units.sort_by_key(|unit| unit.start);

        balance = DayBalance {
            total: day.total_hours().unwrap_or_default(),
            overtime: day.overtime_hours().unwrap_or_default(),
        };
        if !elapsed.is_zero() {
            balance = apply_work(day, balance, elapsed, policy);
        }
    }

    let holidays = date
        .iter_days()
        .take(HOLIDAY_LOOKAHEAD_DAYS)
        .filter_map(|date| {
            let day = ledger.day(date)?;
            day.is_public_holiday().then(|| UpcomingHoliday {
                date,
                name: day.public_holiday_name().unwrap_or_default().to_string(),
            })
        })
        .collect();

    TodayReport {
        date,
        timezone: timezone.into(),
        tracked: day.is_some_and(|day| !day.units().is_empty() || day.total_hours().is_some()),
        units,
        total: balance.total,
        overtime: balance.overtime,
        holidays,
    }
}

/// Formats today's report as human-readable text.
pub fn format_today(report: &TodayReport) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "{} (week {})",
        report.date.format("%A, %Y-%m-%d"),
        report.date.iso_week().week()
    )
    .unwrap();
    output.push('\n');

    if report.tracked {
        if !report.units.is_empty() {
            output.push_str("  Start     End       Duration\n");
            for unit in &report.units {
                let marker = if unit.running {
                    '⏱'
                } else if unit.kind == UnitKind::Compensatory {
                    '-'
                } else {
                    ' '
                };
                write!(
                    output,
                    "{marker} {}  {}  {}",
                    unit.start.format("%H:%M:%S"),
                    unit.stop.format("%H:%M:%S"),
                    format_clock(unit.duration)
                )
                .unwrap();
                if !unit.comment.is_empty() {
                    write!(output, "  {}", unit.comment).unwrap();
                }
                output.push('\n');
            }
            output.push('\n');
        }
        writeln!(output, "Total:    {}", format_clock(report.total)).unwrap();
        writeln!(output, "Overtime: {}", format_clock(report.overtime)).unwrap();
    } else {
        output.push_str("No time tracked today.\n");
    }

    if !report.holidays.is_empty() {
        output.push_str("\nPublic holidays ahead:\n");
        for holiday in &report.holidays {
            writeln!(output, "{}: {}", holiday.date, holiday.name).unwrap();
        }
    }

    output
}

// ========== Quarter ==========

/// Totals of one ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSummary {
    pub year: i32,
    pub week: u32,
    #[serde(serialize_with = "serialize_clock")]
    pub total: TimeDelta,
    #[serde(serialize_with = "serialize_clock")]
    pub overtime: TimeDelta,
}

/// Weekly totals over the current month and the two before it.
#[derive(Debug, Clone, Serialize)]
pub struct QuarterlyReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub weeks: Vec<WeekSummary>,
    #[serde(serialize_with = "serialize_clock")]
    pub total: TimeDelta,
    #[serde(serialize_with = "serialize_clock")]
    pub overtime: TimeDelta,
}

/// Builds the quarterly report, from the first day of the month two months
/// before `today` up to and including `today`.
///
/// Days without recorded time are skipped. Weeks are keyed by ISO year and
/// week so that a range spanning New Year keeps them apart.
pub fn quarterly_report(ledger: &Ledger, today: NaiveDate) -> Result<QuarterlyReport> {
    let from = today
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(QUARTER_PAST_MONTHS)))
        .with_context(|| format!("cannot compute quarter start for {today}"))?;

    let mut weeks: BTreeMap<(i32, u32), (TimeDelta, TimeDelta)> = BTreeMap::new();
    for (date, day) in ledger.days().range(from..=today) {
        let Some(total) = day.total_hours() else {
            continue;
        };
        let iso = date.iso_week();
        let entry = weeks.entry((iso.year(), iso.week())).or_default();
        entry.0 += total;
        entry.1 += day.overtime_hours().unwrap_or_default();
    }

    let weeks: Vec<WeekSummary> = weeks
        .into_iter()
        .map(|((year, week), (total, overtime))| WeekSummary {
            year,
            week,
            total,
            overtime,
        })
        .collect();
    let total = weeks.iter().map(|w| w.total).sum();
    let overtime = weeks.iter().map(|w| w.overtime).sum();

    Ok(QuarterlyReport {
        from,
        to: today,
        weeks,
        total,
        overtime,
    })
}

/// Formats the quarterly report as a table.
pub fn format_quarter(report: &QuarterlyReport) -> String {
    let mut output = String::new();
    writeln!(output, "Weeks from {} to {}", report.from, report.to).unwrap();
    output.push('\n');

    if report.weeks.is_empty() {
        output.push_str("No time tracked in this period.\n");
        return output;
    }

    let separator = format!("{}+{}+{}", "-".repeat(10), "-".repeat(13), "-".repeat(12));
    writeln!(output, "{:<9} | {:>11} | {:>11}", "Week", "Total Hours", "Overtime").unwrap();
    writeln!(output, "{separator}").unwrap();
    for week in &report.weeks {
        writeln!(
            output,
            "{:<9} | {:>11} | {:>11}",
            format!("{}-W{:02}", week.year, week.week),
            format_clock(week.total),
            format_clock(week.overtime)
        )
        .unwrap();
    }
    writeln!(output, "{separator}").unwrap();
    writeln!(
        output,
        "{:<9} | {:>11} | {:>11}",
        "Total",
        format_clock(report.total),
        format_clock(report.overtime)
    )
    .unwrap();

    output
}

// ========== Output ==========

fn serialize_clock<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_clock(*delta))
}

fn serialize_time<S: Serializer>(
    time: &chrono::DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format("%H:%M:%S"))
}

/// Writes today's report.
pub fn print_today<W: Write>(
    writer: &mut W,
    ledger: &Ledger,
    policy: &WorkingHoursPolicy,
    now: Timestamp,
) -> Result<()> {
    let report = today_report(ledger, policy, now, local_timezone());
    write!(writer, "{}", format_today(&report))?;
    Ok(())
}

/// Runs the report command.
pub fn run<W: Write>(
    writer: &mut W,
    ledger: &Ledger,
    policy: &WorkingHoursPolicy,
    now: Timestamp,
    quarter: bool,
    json: bool,
) -> Result<()> {
    if quarter {
        let report = quarterly_report(ledger, now.date_naive())?;
        if json {
            writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        } else {
            write!(writer, "{}", format_quarter(&report))?;
        }
    } else if json {
        let report = today_report(ledger, policy, now, local_timezone());
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        print_today(writer, ledger, policy, now)?;
    }
    Ok(())
}
