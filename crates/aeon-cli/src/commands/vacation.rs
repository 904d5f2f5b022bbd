//! Vacation command.

use aeon_core::Ledger;
use anyhow::Result;
use chrono::NaiveDate;

/// Marks `date` as a vacation day.
pub fn run(ledger: &mut Ledger, date: NaiveDate) -> Result<String> {
    ledger.mark_vacation(date)?;
    Ok(format!("Marked {} as a vacation day.", date.format("%A, %Y-%m-%d")))
}
