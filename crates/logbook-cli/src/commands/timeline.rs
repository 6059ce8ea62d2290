//! Timeline command: hourly table and duty grid for one day.
//!
//! This module implements `logbook timeline`, rendering the 24 derived hour
//! slots both as a table (one row per hour) and as the four-row logbook grid.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use logbook_core::{
    DayWindow, DutyDurations, DutyStatus, HourlySample, HourlyTimeline, RawDutyEvent,
    SkippedEvent, SlotSource, SlotStatus, UnknownPolicy, apply_hourly_samples,
    compute_durations, derive_hourly_slots,
};
use serde::Serialize;

use super::util::{
    format_day, format_duration, format_local_time, load_records, policy_note, report_skipped,
};

/// One derived day, ready for rendering.
#[derive(Debug)]
pub struct DayReport {
    pub date: NaiveDate,
    pub tz: Tz,
    pub timeline: HourlyTimeline,
    pub durations: DutyDurations,
    pub skipped_events: Vec<SkippedEvent>,
    pub skipped_samples: Vec<SkippedEvent>,
    pub excluded: usize,
}

/// Loads events (and optional samples) from disk and derives the day.
pub fn load_day(events: &Path, samples: Option<&Path>, window: DayWindow) -> Result<DayReport> {
    let loaded = load_records::<RawDutyEvent>(events)?;
    let derivation = derive_hourly_slots(&loaded.records, &window);
    let skipped_events = loaded.merge_skipped(derivation.skipped);
    let mut timeline = derivation.timeline;

    let skipped_samples = match samples {
        Some(path) => {
            let loaded = load_records::<HourlySample>(path)?;
            let skipped = apply_hourly_samples(&mut timeline, &loaded.records);
            loaded.merge_skipped(skipped)
        }
        None => Vec::new(),
    };

    let durations = compute_durations(&timeline);
    tracing::debug!(
        date = %window.date,
        skipped = skipped_events.len(),
        excluded = derivation.excluded,
        "derived day"
    );

    Ok(DayReport {
        date: window.date,
        tz: window.tz,
        timeline,
        durations,
        skipped_events,
        skipped_samples,
        excluded: derivation.excluded,
    })
}

// ========== Grid ==========

/// Axis label for an hour column: M, 1..11, N, 1..11.
fn hour_label(hour: u8) -> String {
    match hour {
        0 => "M".to_string(),
        12 => "N".to_string(),
        h => (h % 12).to_string(),
    }
}

/// Renders the four-row logbook grid with per-row totals.
///
/// Sub-states are drawn on their primary row. Unknown hours get their own
/// `--` row, which only appears when the day has unknown hours. Under
/// [`UnknownPolicy::CountAsOffDuty`] they are drawn on the OFF row instead.
pub fn format_grid(timeline: &HourlyTimeline, policy: UnknownPolicy) -> String {
    let totals = compute_durations(timeline)
        .with_unknown_policy(policy)
        .by_primary();
    let mut output = String::new();

    let mut header = String::from("    ");
    for slot in timeline {
        write!(header, "{:>3}", hour_label(slot.hour)).unwrap();
    }
    writeln!(output, "{}", header.trim_end()).unwrap();

    let mut rows: Vec<(&str, SlotStatus)> = DutyStatus::PRIMARY
        .iter()
        .map(|s| (s.short_label(), SlotStatus::Duty(*s)))
        .collect();
    if totals.unknown_minutes() > 0 {
        rows.push(("--", SlotStatus::Unknown));
    }

    for (label, row) in rows {
        let mut line = format!("{label:<4}");
        for slot in timeline {
            let drawn = match (slot.status, policy) {
                (SlotStatus::Unknown, UnknownPolicy::CountAsOffDuty) => {
                    SlotStatus::Duty(DutyStatus::OffDuty)
                }
                (status, _) => status,
            };
            let on_row = match (drawn, row) {
                (SlotStatus::Duty(s), SlotStatus::Duty(r)) => s.primary() == r,
                (SlotStatus::Unknown, SlotStatus::Unknown) => true,
                _ => false,
            };
            line.push_str(if on_row { " ██" } else { "  ·" });
        }
        let minutes = match row {
            SlotStatus::Duty(status) => totals.minutes(status),
            SlotStatus::Unknown => totals.unknown_minutes(),
        };
        writeln!(output, "{line}  {}", format_duration(minutes)).unwrap();
    }

    output
}

// ========== Hourly Table ==========

/// Formats an odometer or engine-hours reading.
fn format_reading(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.1}"),
        None => "-".to_string(),
    }
}

/// Renders one row per hour with the representative event's details.
pub fn format_hourly_table(timeline: &HourlyTimeline, tz: Tz) -> String {
    let mut output = String::new();
    let row = |cells: [&str; 7]| {
        let [hour, status, from, to, odo, eng, loc] = cells;
        let line =
            format!("{hour:<13}  {status:<29}  {from:<5}  {to:<5}  {odo:>9}  {eng:>10}  {loc}");
        line.trim_end().to_string()
    };

    writeln!(
        output,
        "{}",
        row(["HOUR", "STATUS", "FROM", "TO", "ODOMETER", "ENGINE HRS", "LOCATION"])
    )
    .unwrap();

    let mut any_sample = false;
    for slot in timeline {
        let hours = format!("{:02}:00 - {:02}:00", slot.hour, (slot.hour + 1) % 24);
        let mut status = slot.status.to_string();
        if slot.source == SlotSource::Sample {
            status.push('*');
            any_sample = true;
        }
        let event = slot.event.as_ref();
        let from = event.map_or_else(|| "-".to_string(), |e| format_local_time(e.timestamp, tz));
        let to = slot
            .ends_at
            .map_or_else(|| "-".to_string(), |t| format_local_time(t, tz));
        let odometer = format_reading(event.and_then(|e| e.odometer));
        let engine = format_reading(event.and_then(|e| e.engine_hours));
        let location = event
            .and_then(|e| e.location.as_deref())
            .unwrap_or("-");
        writeln!(
            output,
            "{}",
            row([&hours, &status, &from, &to, &odometer, &engine, location])
        )
        .unwrap();
    }

    if any_sample {
        writeln!(output).unwrap();
        writeln!(output, "* from hourly sample").unwrap();
    }

    output
}

/// Formats the full human-readable timeline output.
pub fn format_timeline(report: &DayReport, policy: UnknownPolicy) -> String {
    let mut output = String::new();
    writeln!(
        output,
        "DUTY LOG: {} ({})",
        format_day(report.date),
        report.tz.name()
    )
    .unwrap();
    writeln!(output).unwrap();
    output.push_str(&format_grid(&report.timeline, policy));
    if let Some(note) = policy_note(&report.durations, policy) {
        writeln!(output, "{note}").unwrap();
    }
    writeln!(output).unwrap();
    output.push_str(&format_hourly_table(&report.timeline, report.tz));
    output
}

// ========== JSON ==========

/// A skipped record in JSON output.
#[derive(Debug, Serialize)]
pub struct JsonSkipped {
    pub index: usize,
    pub reason: String,
}

impl From<&SkippedEvent> for JsonSkipped {
    fn from(s: &SkippedEvent) -> Self {
        Self {
            index: s.index,
            reason: s.reason.to_string(),
        }
    }
}

/// JSON timeline structure.
#[derive(Debug, Serialize)]
pub struct JsonTimeline<'a> {
    pub date: String,
    pub timezone: &'a str,
    pub slots: &'a HourlyTimeline,
    pub durations: DutyDurations,
    pub unknown_policy: UnknownPolicy,
    pub skipped_events: Vec<JsonSkipped>,
    pub skipped_samples: Vec<JsonSkipped>,
    pub excluded_events: usize,
}

/// Formats the day as JSON.
pub fn format_timeline_json(report: &DayReport, policy: UnknownPolicy) -> Result<String> {
    let json = JsonTimeline {
        date: report.date.format("%Y-%m-%d").to_string(),
        timezone: report.tz.name(),
        slots: &report.timeline,
        durations: report.durations.with_unknown_policy(policy),
        unknown_policy: policy,
        skipped_events: report.skipped_events.iter().map(JsonSkipped::from).collect(),
        skipped_samples: report.skipped_samples.iter().map(JsonSkipped::from).collect(),
        excluded_events: report.excluded,
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

// ========== Public Interface ==========

/// Runs the timeline command.
pub fn run<W: Write>(
    writer: &mut W,
    report: &DayReport,
    policy: UnknownPolicy,
    json: bool,
) -> Result<()> {
    report_skipped("event", &report.skipped_events);
    report_skipped("hourly sample", &report.skipped_samples);

    if json {
        writeln!(writer, "{}", format_timeline_json(report, policy)?)?;
    } else {
        write!(writer, "{}", format_timeline(report, policy))?;
    }
    Ok(())
}
