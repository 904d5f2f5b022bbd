//! Status command for showing the running unit.

use std::io::Write;

use aeon_core::{Ledger, Timestamp};
use aeon_store::Store;
use anyhow::{Context, Result};

use super::util::format_clock;

pub fn run<W: Write>(writer: &mut W, store: &Store, ledger: &Ledger, now: Timestamp) -> Result<()> {
    writeln!(writer, "Ledger: {}", store.ledger_path().display())?;
    writeln!(writer, "Days:   {}", ledger.days().len())?;

    let running = ledger
        .running_unit()
        .context("ledger points at a running unit that does not exist")?;
    let Some((_, unit)) = running else {
        writeln!(writer, "No unit running.")?;
        return Ok(());
    };

    let since = unit.start().with_timezone(&now.timezone());
    write!(
        writer,
        "Running since {} ({})",
        since.format("%Y-%m-%d %H:%M:%S %:z"),
        format_clock(now - unit.start())
    )?;
    if !unit.comment().is_empty() {
        write!(writer, ": {}", unit.comment())?;
    }
    writeln!(writer)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::DateTime;
    use insta::assert_snapshot;

    fn at(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn status_without_running_unit() {
        let temp = tempfile::tempdir().unwrap();
        let store = Store::new(temp.path());
        let mut output = Vec::new();
        run(&mut output, &store, &Ledger::new(), at("2020-02-05T17:00:00Z")).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.ends_with("Days:   0\nNo unit running.\n"));
    }

    #[test]
    fn status_shows_running_unit_and_elapsed_time() {
        let temp = tempfile::tempdir().unwrap();
        let store = Store::new(temp.path());
        let now = at("2020-02-05T17:00:00+01:00");
        let mut ledger = Ledger::new();
        ledger
            .start(Some(at("2020-02-05T13:30:00+01:00")), "deploy", now)
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &store, &ledger, now).unwrap();

        let output = String::from_utf8(output).unwrap();
        let ledger_line = format!("Ledger: {}\n", store.ledger_path().display());
        let output = output.strip_prefix(&ledger_line).unwrap();
        assert_snapshot!(output, @r"
        Days:   1
        Running since 2020-02-05 13:30:00 +01:00 (03:30:00): deploy
        ");
    }
}
