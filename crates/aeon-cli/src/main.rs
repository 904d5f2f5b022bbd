use std::io::Write;

use aeon_core::{Ledger, Timestamp, UnitKind, WorkingHoursPolicy};
use aeon_store::Store;
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use aeon_cli::commands::{init, report, status, track, vacation};
use aeon_cli::{Cli, Commands, Config};

/// Saves the ledger, then prints the confirmation and optionally today's report.
fn commit<W: Write>(
    writer: &mut W,
    store: &Store,
    ledger: &Ledger,
    message: &str,
    today: Option<(&WorkingHoursPolicy, Timestamp)>,
) -> Result<()> {
    store.save(ledger).context("failed to save ledger")?;
    writeln!(writer, "{message}")?;
    if let Some((policy, now)) = today {
        writeln!(writer)?;
        report::print_today(writer, ledger, policy, now)?;
    }
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let store = Store::new(&config.data_dir);
    let _lock = store.lock().context("failed to lock data directory")?;
    let now = Local::now();
    let policy = &config.working_hours;
    let mut out = std::io::stdout().lock();
    let load = || init::load_or_create(&store, &config, now.year());

    match &cli.command {
        Some(Commands::Init { year, force }) => {
            init::run(
                &mut out,
                &store,
                &config,
                year.unwrap_or_else(|| now.year()),
                *force,
            )?;
        }
        Some(Commands::Start { time, comment }) => {
            let mut ledger = load()?;
            let message = track::start(&mut ledger, time.as_deref(), comment, &now)?;
            let today = Some((policy, now.fixed_offset()));
            commit(&mut out, &store, &ledger, &message, today)?;
        }
        Some(Commands::Stop { time }) => {
            let mut ledger = load()?;
            let message = track::stop(&mut ledger, time.as_deref(), policy, &now)?;
            let today = Some((policy, now.fixed_offset()));
            commit(&mut out, &store, &ledger, &message, today)?;
        }
        Some(Commands::Add {
            start,
            stop,
            comment,
        }) => {
            let mut ledger = load()?;
            let message = track::add(
                &mut ledger,
                UnitKind::Work,
                start,
                stop,
                comment,
                policy,
                &now,
            )?;
            commit(&mut out, &store, &ledger, &message, None)?;
        }
        Some(Commands::Comp {
            start,
            stop,
            comment,
        }) => {
            let mut ledger = load()?;
            let message = track::add(
                &mut ledger,
                UnitKind::Compensatory,
                start,
                stop,
                comment,
                policy,
                &now,
            )?;
            commit(&mut out, &store, &ledger, &message, None)?;
        }
        Some(Commands::Vacation { date }) => {
            let mut ledger = load()?;
            let message = vacation::run(&mut ledger, *date)?;
            commit(&mut out, &store, &ledger, &message, None)?;
        }
        Some(Commands::Status) => {
            status::run(&mut out, &store, &load()?, now.fixed_offset())?;
        }
        Some(Commands::Report { quarter, json }) => {
            report::run(
                &mut out,
                &load()?,
                policy,
                now.fixed_offset(),
                *quarter,
                *json,
            )?;
        }
        None => {
            report::print_today(&mut out, &load()?, policy, now.fixed_offset())?;
        }
    }

    Ok(())
}
