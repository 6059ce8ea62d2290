use std::io;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::Parser;
use logbook_cli::commands::timeline::{DayReport, load_day};
use logbook_cli::commands::util::{parse_date, today_in};
use logbook_cli::commands::{summary, timeline, window};
use logbook_cli::{Cli, Commands, Config, DayArgs};
use logbook_core::{DayWindow, MAX_WINDOW_DAYS};
use tracing_subscriber::EnvFilter;

/// Resolves the reference timezone and date for a command.
fn resolve_day(config: &Config, date: &str, tz: Option<&str>) -> Result<(chrono::NaiveDate, Tz)> {
    let tz = config.reference_tz(tz)?;
    let date = parse_date(date, today_in(tz))?;
    Ok((date, tz))
}

fn load_report(config: &Config, day: &DayArgs) -> Result<DayReport> {
    let (date, tz) = resolve_day(config, &day.date, day.tz.as_deref())?;
    load_day(&day.events, day.samples.as_deref(), DayWindow::new(date, tz))
}

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
        .with_writer(io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let mut stdout = io::stdout();
    match &cli.command {
        Some(Commands::Timeline { day, json }) => {
            let report = load_report(&config, day)?;
            timeline::run(&mut stdout, &report, config.unknown_policy, *json)?;
        }
        Some(Commands::Summary { day, json }) => {
            let report = load_report(&config, day)?;
            summary::run(&mut stdout, &report, config.unknown_policy, *json)?;
        }
        Some(Commands::Window {
            logs,
            date,
            days,
            tz,
            json,
        }) => {
            let (reference, tz) = resolve_day(&config, date, tz.as_deref())?;
            let days = days.unwrap_or(config.window_days);
            anyhow::ensure!(
                (1..=MAX_WINDOW_DAYS).contains(&days),
                "window must cover between 1 and {MAX_WINDOW_DAYS} days, got {days}"
            );
            window::run(
                &mut stdout,
                logs,
                reference,
                days,
                tz,
                config.unknown_policy,
                *json,
            )?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
