//! Multi-day rollups such as the "previous 7 days" summary.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::durations::DutyDurations;
use crate::types::Certification;

/// What is known about one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayEntry {
    /// No log was submitted for the day.
    NoLog,
    /// A log exists. Its slots may still be entirely unknown.
    Logged {
        durations: DutyDurations,
        certification: Certification,
    },
}

impl DayEntry {
    pub const fn is_logged(&self) -> bool {
        matches!(self, Self::Logged { .. })
    }
}

/// Per-day input to [`aggregate_over_window`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLog {
    pub date: NaiveDate,
    pub entry: DayEntry,
}

impl DailyLog {
    pub const fn logged(
        date: NaiveDate,
        durations: DutyDurations,
        certification: Certification,
    ) -> Self {
        Self {
            date,
            entry: DayEntry::Logged {
                durations,
                certification,
            },
        }
    }

    pub const fn no_log(date: NaiveDate) -> Self {
        Self {
            date,
            entry: DayEntry::NoLog,
        }
    }
}

/// Longest window [`aggregate_over_window`] will expand: ten years.
pub const MAX_WINDOW_DAYS: u32 = 3653;

/// Rollup over the `window_days` calendar days ending at `reference`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub reference: NaiveDate,
    pub window_days: u32,
    /// One entry per calendar day, oldest first.
    pub days: Vec<DailyLog>,
    /// Sum over logged days only.
    pub totals: DutyDurations,
    pub logged_days: usize,
    pub missing_days: usize,
    pub certified_days: usize,
    pub uncertified_days: usize,
}

impl WindowSummary {
    /// First date covered by the window, if it covers any.
    pub fn start(&self) -> Option<NaiveDate> {
        self.days.first().map(|d| d.date)
    }
}

/// Sums daily durations over the most recent `window_days` days.
///
/// Every day in the window appears in the breakdown. Days missing from
/// `daily` are reported as [`DayEntry::NoLog`], never as unknown time.
/// Entries outside the window are ignored; for duplicate dates the later
/// entry wins.
///
/// `window_days` is capped at [`MAX_WINDOW_DAYS`], and the window never
/// reaches before the first representable date. `window_days` on the
/// summary is the number of days actually covered.
pub fn aggregate_over_window(
    daily: &[DailyLog],
    reference: NaiveDate,
    window_days: u32,
) -> WindowSummary {
    let requested = window_days.min(MAX_WINDOW_DAYS);
    let dates: Vec<NaiveDate> = match requested.checked_sub(1) {
        None => Vec::new(),
        Some(back) => {
            let first = reference
                .checked_sub_days(Days::new(u64::from(back)))
                .unwrap_or(NaiveDate::MIN);
            first.iter_days().take_while(|d| *d <= reference).collect()
        }
    };
    let first = dates.first().copied().unwrap_or(reference);
    let covered = u32::try_from(dates.len()).unwrap_or(requested);
    if covered != window_days {
        tracing::warn!(
            requested = window_days,
            covered,
            "duty window shortened"
        );
    }

    let by_date: HashMap<NaiveDate, &DayEntry> = daily
        .iter()
        .filter(|d| !dates.is_empty() && d.date >= first && d.date <= reference)
        .map(|d| (d.date, &d.entry))
        .collect();

    let mut summary = WindowSummary {
        reference,
        window_days: covered,
        days: Vec::with_capacity(dates.len()),
        totals: DutyDurations::default(),
        logged_days: 0,
        missing_days: 0,
        certified_days: 0,
        uncertified_days: 0,
    };

    for date in dates {
        let entry = by_date.get(&date).map_or(DayEntry::NoLog, |e| (*e).clone());

        match &entry {
            DayEntry::NoLog => summary.missing_days += 1,
            DayEntry::Logged {
                durations,
                certification,
            } => {
                summary.logged_days += 1;
                summary.totals += durations;
                if certification.is_certified() {
                    summary.certified_days += 1;
                } else {
                    summary.uncertified_days += 1;
                }
            }
        }

        summary.days.push(DailyLog { date, entry });
    }

    tracing::debug!(
        %reference,
        window_days = summary.window_days,
        logged = summary.logged_days,
        missing = summary.missing_days,
        "aggregated duty window"
    );

    summary
}
