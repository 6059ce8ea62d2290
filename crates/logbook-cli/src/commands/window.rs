//! Window command: multi-day duty rollup.
//!
//! Reads one driver's daily logs, derives every day in parallel, and sums
//! them over the window ending at the reference date. Days with no log in
//! the file are listed as "no log", never as unknown time.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;
use logbook_core::{
    Certification, DayDerivation, DayEntry, DayInput, DayWindow, DriverDay, DriverId,
    DutyDurations, DutyStatus, HourlySample, RawDutyEvent, UnknownPolicy, WindowSummary,
    aggregate_over_window, derive_days,
};
use serde::{Deserialize, Serialize};

use super::util::{RecordIndex, format_day, format_duration, from_values, report_skipped};

/// A driver's logs as read from disk.
#[derive(Debug, Deserialize)]
pub struct LogsFile {
    pub driver_id: String,
    #[serde(default)]
    pub logs: Vec<LogRecord>,
}

/// One submitted daily log.
///
/// Events and samples stay as raw JSON here so that one record of the wrong
/// shape is skipped for its day instead of failing the whole file.
#[derive(Debug, Deserialize)]
pub struct LogRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub certified: bool,
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
    #[serde(default, alias = "hourlySamples")]
    pub hourly_samples: Vec<serde_json::Value>,
}

/// Input positions for one log's events and samples.
#[derive(Debug, Clone, Default)]
pub struct LogIndex {
    pub events: RecordIndex,
    pub samples: RecordIndex,
}

/// Logs ready for derivation.
#[derive(Debug)]
pub struct PreparedLogs {
    pub driver: DriverId,
    pub inputs: Vec<DayInput>,
    /// One entry per input, in the same order.
    pub indices: Vec<LogIndex>,
}

impl PreparedLogs {
    /// Derives every day in parallel. Skip reports index into each log's
    /// own `events` and `hourly_samples` lists.
    pub fn derive(&self) -> Vec<DayDerivation> {
        let mut derivations = derive_days(&self.inputs);
        for (derivation, index) in derivations.iter_mut().zip(&self.indices) {
            derivation.skipped_events = index
                .events
                .merge_skipped(std::mem::take(&mut derivation.skipped_events));
            derivation.skipped_samples = index
                .samples
                .merge_skipped(std::mem::take(&mut derivation.skipped_samples));
        }
        derivations
    }
}

impl LogsFile {
    /// Reads and parses a logs file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse logs file {}", path.display()))
    }

    /// Builds one derivation input per log, each in `tz`.
    pub fn prepare(self, tz: Tz) -> Result<PreparedLogs> {
        let driver = DriverId::new(self.driver_id).context("invalid driver_id in logs file")?;
        let mut inputs = Vec::with_capacity(self.logs.len());
        let mut indices = Vec::with_capacity(self.logs.len());

        for log in self.logs {
            let (events, events_index) = from_values::<RawDutyEvent>(log.events).into_parts();
            let (samples, samples_index) =
                from_values::<HourlySample>(log.hourly_samples).into_parts();
            inputs.push(DayInput {
                day: DriverDay::new(driver.clone(), DayWindow::new(log.date, tz)),
                events,
                samples,
                certification: Certification::from(log.certified),
            });
            indices.push(LogIndex {
                events: events_index,
                samples: samples_index,
            });
        }

        Ok(PreparedLogs {
            driver,
            inputs,
            indices,
        })
    }
}

/// Derives every log and rolls the window up.
pub fn summarize(
    derivations: &[DayDerivation],
    reference: NaiveDate,
    window_days: u32,
    policy: UnknownPolicy,
) -> WindowSummary {
    let daily: Vec<_> = derivations
        .iter()
        .map(|d| {
            let mut log = d.to_daily_log();
            if let DayEntry::Logged { durations, .. } = &mut log.entry {
                *durations = durations.with_unknown_policy(policy);
            }
            log
        })
        .collect();
    aggregate_over_window(&daily, reference, window_days)
}

fn push_row(output: &mut String, cells: [&str; 8]) {
    let [date, log, cert, off, sb, d, on, unknown] = cells;
    let line = format!(
        "{date:<10}  {log:<7}  {cert:<9}  {off:>8}  {sb:>8}  {d:>8}  {on:>8}  {unknown:>8}"
    );
    writeln!(output, "{}", line.trim_end()).unwrap();
}

fn duration_cells(durations: &DutyDurations) -> [String; 5] {
    let rolled = durations.by_primary();
    [
        format_duration(rolled.minutes(DutyStatus::OffDuty)),
        format_duration(rolled.minutes(DutyStatus::Sleeper)),
        format_duration(rolled.minutes(DutyStatus::Driving)),
        format_duration(rolled.minutes(DutyStatus::OnDuty)),
        format_duration(rolled.unknown_minutes()),
    ]
}

/// Formats the window breakdown as a table, oldest day first.
pub fn format_window(driver: &DriverId, tz: Tz, summary: &WindowSummary) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "DUTY WINDOW: {driver}, {} days ending {} ({})",
        summary.window_days,
        format_day(summary.reference),
        tz.name()
    )
    .unwrap();
    writeln!(output).unwrap();

    push_row(
        &mut output,
        ["DATE", "LOG", "CERTIFIED", "OFF", "SB", "D", "ON", "UNKNOWN"],
    );
    for day in &summary.days {
        let date = day.date.format("%Y-%m-%d").to_string();
        match &day.entry {
            DayEntry::NoLog => {
                push_row(&mut output, [&date, "no log", "-", "-", "-", "-", "-", "-"]);
            }
            DayEntry::Logged {
                durations,
                certification,
            } => {
                let cert = if certification.is_certified() { "yes" } else { "no" };
                let [off, sb, d, on, unknown] = duration_cells(durations);
                push_row(&mut output, [&date, "logged", cert, &off, &sb, &d, &on, &unknown]);
            }
        }
    }

    let [off, sb, d, on, unknown] = duration_cells(&summary.totals);
    writeln!(output).unwrap();
    push_row(&mut output, ["TOTAL", "", "", &off, &sb, &d, &on, &unknown]);
    writeln!(output).unwrap();
    writeln!(
        output,
        "Logged: {}  No log: {}  Certified: {}  Uncertified: {}",
        summary.logged_days, summary.missing_days, summary.certified_days, summary.uncertified_days
    )
    .unwrap();

    output
}

/// JSON window structure.
#[derive(Debug, Serialize)]
pub struct JsonWindow<'a> {
    pub driver_id: &'a DriverId,
    pub timezone: &'a str,
    pub unknown_policy: UnknownPolicy,
    #[serde(flatten)]
    pub summary: &'a WindowSummary,
}

/// Runs the window command.
pub fn run<W: Write>(
    writer: &mut W,
    logs: &Path,
    reference: NaiveDate,
    window_days: u32,
    tz: Tz,
    policy: UnknownPolicy,
    json: bool,
) -> Result<()> {
    let prepared = LogsFile::load(logs)?.prepare(tz)?;
    let derivations = prepared.derive();
    let driver = &prepared.driver;

    for d in &derivations {
        let date = d.day.window.date;
        report_skipped(&format!("event on {date}"), &d.skipped_events);
        report_skipped(&format!("hourly sample on {date}"), &d.skipped_samples);
    }

    let summary = summarize(&derivations, reference, window_days, policy);

    if json {
        let json = JsonWindow {
            driver_id: driver,
            timezone: tz.name(),
            unknown_policy: policy,
            summary: &summary,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&json)?)?;
    } else {
        write!(writer, "{}", format_window(driver, tz, &summary))?;
    }
    Ok(())
}
