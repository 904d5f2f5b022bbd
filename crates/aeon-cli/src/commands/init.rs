//! Init command and ledger bootstrap.

use std::io::Write;

use aeon_core::{HolidayCalendar, Ledger};
use aeon_holidays::PublicHolidaysConfig;
use aeon_store::{Store, StoreError};
use anyhow::{Context, Result};

use crate::Config;

/// Looks up public holidays for `year`, or none when lookups are disabled.
pub fn fetch_holidays(config: &PublicHolidaysConfig, year: i32) -> Result<HolidayCalendar> {
    if !config.enabled {
        tracing::debug!(year, "public holiday lookup disabled");
        return Ok(HolidayCalendar::new());
    }

    let client = aeon_holidays::Client::new().context("failed to create holiday client")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    runtime
        .block_on(client.lookup(config, year))
        .with_context(|| format!("failed to load public holidays for {} {year}", config.country))
}

/// Builds a fresh ledger for `year` with its public holidays marked.
pub fn create_ledger(config: &Config, year: i32) -> Result<Ledger> {
    let holidays = fetch_holidays(&config.public_holidays, year)?;
    Ok(Ledger::for_year(year, &holidays)?)
}

/// Loads the stored ledger, creating and saving one for `year` if none exists.
pub fn load_or_create(store: &Store, config: &Config, year: i32) -> Result<Ledger> {
    match store.load() {
        Ok(ledger) => Ok(ledger),
        Err(StoreError::NotFound { .. }) => {
            tracing::info!(
                year,
                path = %store.ledger_path().display(),
                "no ledger found, creating one"
            );
            let ledger = create_ledger(config, year)?;
            store.save(&ledger).context("failed to save new ledger")?;
            Ok(ledger)
        }
        Err(e) => Err(e).context("failed to load ledger"),
    }
}

/// Runs the init command.
pub fn run<W: Write>(
    writer: &mut W,
    store: &Store,
    config: &Config,
    year: i32,
    force: bool,
) -> Result<()> {
    if store.exists() && !force {
        anyhow::bail!(
            "a ledger already exists at {} (use --force to replace it)",
            store.ledger_path().display()
        );
    }

    let ledger = create_ledger(config, year)?;
    store.save(&ledger).context("failed to save ledger")?;

    let holidays = ledger
        .days()
        .values()
        .filter(|day| day.is_public_holiday())
        .count();
    writeln!(writer, "Year:     {year}")?;
    writeln!(writer, "Days:     {}", ledger.days().len())?;
    writeln!(writer, "Holidays: {holidays}")?;
    writeln!(writer, "Saved to: {}", store.ledger_path().display())?;

    Ok(())
}
