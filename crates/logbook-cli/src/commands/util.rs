//! Shared utilities for CLI commands.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use logbook_core::{DutyDurations, EventError, SkippedEvent, UnknownPolicy};
use regex::Regex;
use serde::de::DeserializeOwned;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bound for relative dates (~100 years in days).
const MAX_RELATIVE_DAYS: i64 = 100 * 366;

/// Parse a date string as ISO 8601, a keyword, or a relative date.
///
/// Supports:
/// - ISO 8601: "2026-01-15"
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    match s {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, 'today', 'yesterday', or relative (e.g., '3 days ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;

    let days_per_unit = match &caps[2] {
        "day" => 1,
        "week" => 7,
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };

    if n > MAX_RELATIVE_DAYS / days_per_unit {
        anyhow::bail!("Relative date value too large: {n} {}", &caps[2]);
    }

    Ok(today - Duration::days(n * days_per_unit))
}

/// Today's date in `tz`.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Where each readable record sat in its input, plus the records that were
/// not readable at all.
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    /// `positions[i]` is the input position of the `i`th readable record.
    pub positions: Vec<usize>,
    pub unreadable: Vec<SkippedEvent>,
}

impl RecordIndex {
    /// Maps skip reports indexed into the readable records back to input
    /// positions and merges them with the unreadable records.
    pub fn merge_skipped(&self, skipped: Vec<SkippedEvent>) -> Vec<SkippedEvent> {
        let mut all: Vec<SkippedEvent> = skipped
            .into_iter()
            .map(|s| SkippedEvent {
                index: self.positions.get(s.index).copied().unwrap_or(s.index),
                reason: s.reason,
            })
            .chain(self.unreadable.iter().cloned())
            .collect();
        all.sort_by_key(|s| s.index);
        all
    }
}

/// Records read from a JSON array, a JSONL file, or an embedded list.
#[derive(Debug)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub index: RecordIndex,
}

impl<T> Loaded<T> {
    pub fn merge_skipped(&self, skipped: Vec<SkippedEvent>) -> Vec<SkippedEvent> {
        self.index.merge_skipped(skipped)
    }

    /// Splits the records from their index.
    pub fn into_parts(self) -> (Vec<T>, RecordIndex) {
        (self.records, self.index)
    }
}

/// Reads records from `path`.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Loaded<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_records(&content).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses a JSON array, or one JSON value per line.
///
/// A malformed line is recorded and skipped. A malformed array is an error,
/// since there is no way to tell where the bad record ends.
pub fn parse_records<T: DeserializeOwned>(content: &str) -> anyhow::Result<Loaded<T>> {
    let values: Vec<Result<serde_json::Value, String>> = if content.trim_start().starts_with('[')
    {
        serde_json::from_str::<Vec<serde_json::Value>>(content)
            .context("expected a JSON array of records")?
            .into_iter()
            .map(Ok)
            .collect()
    } else {
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(|e| e.to_string()))
            .collect()
    };

    Ok(convert_values(values))
}

/// Converts already-parsed JSON values, skipping the ones of the wrong shape.
pub fn from_values<T: DeserializeOwned>(values: Vec<serde_json::Value>) -> Loaded<T> {
    convert_values(values.into_iter().map(Ok))
}

fn convert_values<T, I>(values: I) -> Loaded<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = Result<serde_json::Value, String>>,
{
    let mut loaded = Loaded {
        records: Vec::new(),
        index: RecordIndex::default(),
    };

    for (index, value) in values.into_iter().enumerate() {
        match value.and_then(|v| serde_json::from_value::<T>(v).map_err(|e| e.to_string())) {
            Ok(record) => {
                loaded.records.push(record);
                loaded.index.positions.push(index);
            }
            Err(message) => {
                tracing::warn!(index, error = %message, "skipping unreadable record");
                loaded.index.unreadable.push(SkippedEvent {
                    index,
                    reason: EventError::Unreadable(message),
                });
            }
        }
    }

    loaded
}

/// Formats minutes as duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative durations are treated as 0m.
pub fn format_duration(minutes: i64) -> String {
    if minutes < 0 {
        return "0m".to_string();
    }
    let hours = minutes / 60;
    let minutes = minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Formats an instant as local wall-clock `HH:MM`.
pub fn format_local_time(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}

/// "Monday, Jun 2, 2025"
pub fn format_day(date: NaiveDate) -> String {
    date.format("%A, %b %-d, %Y").to_string()
}

/// The line explaining that unknown time was counted as off duty, if it was.
pub fn policy_note(durations: &DutyDurations, policy: UnknownPolicy) -> Option<String> {
    let unknown = durations.unknown_minutes();
    (policy == UnknownPolicy::CountAsOffDuty && unknown > 0).then(|| {
        format!(
            "Note: {} without a recorded status counted as OFF_DUTY.",
            format_duration(unknown)
        )
    })
}

/// Writes skipped-record warnings to stderr.
pub fn report_skipped(label: &str, skipped: &[SkippedEvent]) {
    for s in skipped {
        eprintln!("warning: skipped {label} #{}: {}", s.index, s.reason);
    }
}
