//! Summary command: time per duty status for one day.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use logbook_core::{DutyDurations, DutyStatus, UnknownPolicy};
use serde::Serialize;

use super::timeline::{DayReport, JsonSkipped};
use super::util::{format_day, format_duration, policy_note, report_skipped};

fn push_row(output: &mut String, label: &str, minutes: i64) {
    writeln!(output, "{label:<30}{:>8}", format_duration(minutes)).unwrap();
}

/// Formats the durations report.
///
/// The four grid statuses are always listed; sub-states only when they
/// carry time. Unknown time gets its own line unless the policy folds it
/// into off duty.
pub fn format_summary(report: &DayReport, policy: UnknownPolicy) -> String {
    let durations = report.durations.with_unknown_policy(policy);
    let mut output = String::new();

    writeln!(
        output,
        "DUTY SUMMARY: {} ({})",
        format_day(report.date),
        report.tz.name()
    )
    .unwrap();
    writeln!(output).unwrap();

    writeln!(output, "BY STATUS").unwrap();
    writeln!(output, "─────────").unwrap();
    for status in DutyStatus::ALL {
        let minutes = durations.minutes(status);
        if minutes > 0 || status.primary() == status {
            push_row(&mut output, status.as_str(), minutes);
        }
    }
    if policy == UnknownPolicy::Distinct {
        push_row(&mut output, "UNKNOWN", durations.unknown_minutes());
    }

    let has_sub_states = durations
        .iter()
        .any(|(status, minutes)| minutes > 0 && status.primary() != status);
    if has_sub_states {
        let rolled = durations.by_primary();
        writeln!(output).unwrap();
        writeln!(output, "BY GRID ROW").unwrap();
        writeln!(output, "───────────").unwrap();
        for status in DutyStatus::PRIMARY {
            push_row(&mut output, status.short_label(), rolled.minutes(status));
        }
    }

    writeln!(output).unwrap();
    push_row(&mut output, "TOTAL", durations.total_minutes());

    if let Some(note) = policy_note(&report.durations, policy) {
        writeln!(output).unwrap();
        writeln!(output, "{note}").unwrap();
    }

    output
}

/// JSON summary structure.
#[derive(Debug, Serialize)]
pub struct JsonSummary {
    pub date: String,
    pub timezone: String,
    pub unknown_policy: UnknownPolicy,
    pub durations: DutyDurations,
    pub by_primary: DutyDurations,
    pub total_minutes: i64,
    pub skipped_events: Vec<JsonSkipped>,
    pub skipped_samples: Vec<JsonSkipped>,
}

/// Formats the durations as JSON.
pub fn format_summary_json(report: &DayReport, policy: UnknownPolicy) -> Result<String> {
    let durations = report.durations.with_unknown_policy(policy);
    let json = JsonSummary {
        date: report.date.format("%Y-%m-%d").to_string(),
        timezone: report.tz.name().to_string(),
        unknown_policy: policy,
        by_primary: durations.by_primary(),
        total_minutes: durations.total_minutes(),
        durations,
        skipped_events: report.skipped_events.iter().map(JsonSkipped::from).collect(),
        skipped_samples: report.skipped_samples.iter().map(JsonSkipped::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Runs the summary command.
pub fn run<W: Write>(
    writer: &mut W,
    report: &DayReport,
    policy: UnknownPolicy,
    json: bool,
) -> Result<()> {
    report_skipped("event", &report.skipped_events);
    report_skipped("hourly sample", &report.skipped_samples);

    if json {
        writeln!(writer, "{}", format_summary_json(report, policy)?)?;
    } else {
        write!(writer, "{}", format_summary(report, policy))?;
    }
    Ok(())
}
