//! Batch derivation across many driver-days.

use rayon::prelude::*;

use crate::day::DriverDay;
use crate::durations::{DutyDurations, compute_durations};
use crate::event::{RawDutyEvent, SkippedEvent};
use crate::timeline::{HourlySample, HourlyTimeline, apply_hourly_samples, derive_hourly_slots};
use crate::types::Certification;
use crate::window::DailyLog;

/// Everything needed to derive one driver-day.
#[derive(Debug, Clone)]
pub struct DayInput {
    pub day: DriverDay,
    pub events: Vec<RawDutyEvent>,
    /// Explicit hourly overrides, applied after derivation.
    pub samples: Vec<HourlySample>,
    pub certification: Certification,
}

/// The derived logbook for one driver-day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDerivation {
    pub day: DriverDay,
    pub timeline: HourlyTimeline,
    pub durations: DutyDurations,
    /// Malformed events, then malformed samples.
    pub skipped_events: Vec<SkippedEvent>,
    pub skipped_samples: Vec<SkippedEvent>,
    pub excluded: usize,
    pub certification: Certification,
}

impl DayDerivation {
    /// Converts to a window entry. A derived day always counts as logged.
    pub fn to_daily_log(&self) -> DailyLog {
        DailyLog::logged(
            self.day.window.date,
            self.durations.clone(),
            self.certification,
        )
    }
}

/// Derives a single driver-day: timeline, sample overrides, durations.
pub fn derive_day(input: &DayInput) -> DayDerivation {
    let derivation = derive_hourly_slots(&input.events, &input.day.window);
    let mut timeline = derivation.timeline;
    let skipped_samples = apply_hourly_samples(&mut timeline, &input.samples);
    let durations = compute_durations(&timeline);

    DayDerivation {
        day: input.day.clone(),
        timeline,
        durations,
        skipped_events: derivation.skipped,
        skipped_samples,
        excluded: derivation.excluded,
        certification: input.certification,
    }
}

/// Derives many driver-days in parallel. Output order matches input order.
pub fn derive_days(inputs: &[DayInput]) -> Vec<DayDerivation> {
    inputs.par_iter().map(derive_day).collect()
}
