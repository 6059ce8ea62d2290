//! Hourly timeline derivation.
//!
//! Turns a sparse, possibly unsorted list of duty status changes into 24
//! hour slots for one day.
//!
//! # Algorithm Summary
//!
//! 1. Parse raw events, recording the malformed ones instead of failing
//! 2. Drop events outside the day window
//! 3. Stable-sort by timestamp (equal timestamps keep input order)
//! 4. Walk the hours with a single cursor: each slot takes the last event at
//!    or before `hour:59:59.999` local, or `Unknown` if there is none

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::day::{DayWindow, HOURS_PER_DAY};
use crate::duty_status::DutyStatus;
use crate::event::{DutyEvent, EventError, RawDutyEvent, SkippedEvent, parse_events};

/// Status assigned to a slot. `Unknown` means no event covers the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    Duty(DutyStatus),
    Unknown,
}

impl SlotStatus {
    /// The duty status, if known.
    pub const fn duty(self) -> Option<DutyStatus> {
        match self {
            Self::Duty(status) => Some(status),
            Self::Unknown => None,
        }
    }

    pub const fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duty(status) => f.write_str(status.as_str()),
            Self::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

impl Serialize for SlotStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("UNKNOWN") {
            return Ok(Self::Unknown);
        }
        s.parse().map(Self::Duty).map_err(serde::de::Error::custom)
    }
}

/// Where a slot's status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSource {
    /// Derived from the event list.
    Derived,
    /// Taken from an explicit hourly sample.
    Sample,
}

/// One hour of the logbook grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSlot {
    pub hour: u8,
    pub status: SlotStatus,
    pub source: SlotSource,
    /// The event this slot represents. Absent for unknown slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<DutyEvent>,
    /// When the represented status ended: the next recorded change that day,
    /// or a sample's `end_time`. Absent if it runs past the slot's day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
}

impl HourSlot {
    const fn unknown(hour: u8) -> Self {
        Self {
            hour,
            status: SlotStatus::Unknown,
            source: SlotSource::Derived,
            event: None,
            ends_at: None,
        }
    }

    fn from_event(hour: u8, event: &DutyEvent, ends_at: Option<DateTime<Utc>>) -> Self {
        Self {
            hour,
            status: SlotStatus::Duty(event.status),
            source: SlotSource::Derived,
            event: Some(event.clone()),
            ends_at,
        }
    }
}

/// Exactly 24 hour slots, hour 0 first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HourlyTimeline {
    slots: Vec<HourSlot>,
}

impl HourlyTimeline {
    /// A timeline where every hour is unknown.
    pub fn unknown() -> Self {
        Self {
            slots: (0..HOURS_PER_DAY).map(|h| HourSlot::unknown(hour_u8(h))).collect(),
        }
    }

    pub fn slots(&self) -> &[HourSlot] {
        &self.slots
    }

    /// The slot for `hour`, if `hour` is 0..=23.
    pub fn slot(&self, hour: usize) -> Option<&HourSlot> {
        self.slots.get(hour)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HourSlot> {
        self.slots.iter()
    }
}

impl<'a> IntoIterator for &'a HourlyTimeline {
    type Item = &'a HourSlot;
    type IntoIter = std::slice::Iter<'a, HourSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}

/// Result of deriving one day from raw events.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub timeline: HourlyTimeline,
    /// Events that failed validation, with their input index.
    pub skipped: Vec<SkippedEvent>,
    /// Number of valid events that fell outside the day.
    pub excluded: usize,
}

/// Derives the 24-slot timeline from raw events.
///
/// Malformed events are skipped and reported; they never abort the day.
/// Events outside `window` are dropped silently and counted.
pub fn derive_hourly_slots(events: &[RawDutyEvent], window: &DayWindow) -> Derivation {
    let (parsed, skipped) = parse_events(events);
    let (timeline, excluded) = derive_with_exclusions(&parsed, window);
    Derivation {
        timeline,
        skipped,
        excluded,
    }
}

/// Derives the 24-slot timeline from already-validated events.
pub fn derive_timeline(events: &[DutyEvent], window: &DayWindow) -> HourlyTimeline {
    derive_with_exclusions(events, window).0
}

fn derive_with_exclusions(events: &[DutyEvent], window: &DayWindow) -> (HourlyTimeline, usize) {
    let start = window.start();
    let end = window.end();

    let mut in_day: Vec<&DutyEvent> = events
        .iter()
        .filter(|e| e.timestamp >= start && e.timestamp <= end)
        .collect();
    let excluded = events.len() - in_day.len();
    if excluded > 0 {
        tracing::debug!(excluded, date = %window.date, "dropped events outside day window");
    }

    // sort_by_key is stable, so equal timestamps keep input order and the
    // later one wins below.
    in_day.sort_by_key(|e| e.timestamp);

    let mut slots = Vec::with_capacity(HOURS_PER_DAY);
    let mut cursor = 0;
    let mut current: Option<&DutyEvent> = None;
    for hour in 0..HOURS_PER_DAY {
        let slot_end = window.slot_end(hour);
        while let Some(event) = in_day.get(cursor).filter(|e| e.timestamp <= slot_end) {
            current = Some(*event);
            cursor += 1;
        }
        let ends_at = in_day.get(cursor).map(|next| next.timestamp);
        slots.push(current.map_or_else(
            || HourSlot::unknown(hour_u8(hour)),
            |event| HourSlot::from_event(hour_u8(hour), event, ends_at),
        ));
    }

    (HourlyTimeline { slots }, excluded)
}

/// A precomputed hourly status supplied by the back end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub hour: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f64>,
    #[serde(
        default,
        alias = "engineHours",
        skip_serializing_if = "Option::is_none"
    )]
    pub engine_hours: Option<f64>,
}

/// Overrides derived slots with explicit hourly samples.
///
/// Later samples for the same hour win. Samples with an invalid hour or
/// status are returned as skipped and leave the derived slot untouched.
pub fn apply_hourly_samples(
    timeline: &mut HourlyTimeline,
    samples: &[HourlySample],
) -> Vec<SkippedEvent> {
    let mut skipped = Vec::new();

    for (index, sample) in samples.iter().enumerate() {
        let hour = match usize::try_from(sample.hour) {
            Ok(h) if h < HOURS_PER_DAY => h,
            _ => {
                let reason = EventError::HourOutOfRange(sample.hour);
                tracing::warn!(index, error = %reason, "skipping hourly sample");
                skipped.push(SkippedEvent { index, reason });
                continue;
            }
        };

        let status = match sample.status.as_deref() {
            None => Err(EventError::MissingStatus),
            Some(s) if s.eq_ignore_ascii_case("UNKNOWN") => Ok(SlotStatus::Unknown),
            Some(s) => s
                .parse::<DutyStatus>()
                .map(SlotStatus::Duty)
                .map_err(EventError::from),
        };
        let status = match status {
            Ok(status) => status,
            Err(reason) => {
                tracing::warn!(index, error = %reason, "skipping hourly sample");
                skipped.push(SkippedEvent { index, reason });
                continue;
            }
        };

        let event = match (status, sample.start_time) {
            (SlotStatus::Duty(duty), Some(timestamp)) => Some(DutyEvent {
                timestamp,
                status: duty,
                location: sample.location.clone(),
                odometer: sample.odometer,
                engine_hours: sample.engine_hours,
            }),
            _ => None,
        };

        timeline.slots[hour] = HourSlot {
            hour: hour_u8(hour),
            status,
            source: SlotSource::Sample,
            event,
            ends_at: sample.end_time,
        };
    }

    skipped
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "hour is always below HOURS_PER_DAY"
)]
const fn hour_u8(hour: usize) -> u8 {
    hour as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn day() -> DayWindow {
        DayWindow::utc(NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid test date"))
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, hour, minute, 0)
            .single()
            .expect("valid test timestamp")
    }

    fn raw(ts: DateTime<Utc>, status: &str) -> RawDutyEvent {
        RawDutyEvent {
            timestamp: Some(ts.to_rfc3339()),
            status: Some(status.to_string()),
            ..RawDutyEvent::default()
        }
    }

    fn statuses(timeline: &HourlyTimeline) -> Vec<SlotStatus> {
        timeline.iter().map(|s| s.status).collect()
    }

    const DRIVING: SlotStatus = SlotStatus::Duty(DutyStatus::Driving);
    const OFF: SlotStatus = SlotStatus::Duty(DutyStatus::OffDuty);

    #[test]
    fn empty_input_is_all_unknown() {
        let derivation = derive_hourly_slots(&[], &day());
        assert_eq!(derivation.timeline.slots().len(), 24);
        assert!(derivation.timeline.iter().all(|s| s.status.is_unknown()));
        assert!(derivation.timeline.iter().all(|s| s.event.is_none()));
        assert!(derivation.skipped.is_empty());
    }

    #[test]
    fn as_of_lookup_uses_last_event_before_hour_end() {
        let events = vec![
            DutyEvent::new(at(6, 0), DutyStatus::Driving),
            DutyEvent::new(at(14, 0), DutyStatus::OffDuty),
        ];
        let timeline = derive_timeline(&events, &day());

        assert!(timeline.slot(5).unwrap().status.is_unknown());
        assert_eq!(timeline.slot(6).unwrap().status, DRIVING);
        assert_eq!(timeline.slot(10).unwrap().status, DRIVING);
        assert_eq!(timeline.slot(13).unwrap().status, DRIVING);
        assert_eq!(timeline.slot(14).unwrap().status, OFF);
        assert_eq!(timeline.slot(23).unwrap().status, OFF);
    }

    #[test]
    fn slot_ends_at_next_change() {
        let events = vec![
            DutyEvent::new(at(6, 0), DutyStatus::Driving),
            DutyEvent::new(at(14, 30), DutyStatus::OffDuty),
        ];
        let timeline = derive_timeline(&events, &day());

        assert_eq!(timeline.slot(5).unwrap().ends_at, None);
        assert_eq!(timeline.slot(6).unwrap().ends_at, Some(at(14, 30)));
        assert_eq!(timeline.slot(13).unwrap().ends_at, Some(at(14, 30)));
        // The change lands inside hour 14, so that slot already shows OFF.
        assert_eq!(timeline.slot(14).unwrap().ends_at, None);
        assert_eq!(timeline.slot(23).unwrap().ends_at, None);
    }

    #[test]
    fn mid_hour_change_takes_latest_in_hour() {
        let events = vec![
            DutyEvent::new(at(8, 5), DutyStatus::OnDuty),
            DutyEvent::new(at(8, 50), DutyStatus::Driving),
        ];
        let timeline = derive_timeline(&events, &day());
        assert_eq!(timeline.slot(8).unwrap().status, DRIVING);
    }

    #[test]
    fn event_at_last_millisecond_counts_for_that_hour() {
        let ts = at(9, 59) + Duration::seconds(59) + Duration::milliseconds(999);
        let timeline = derive_timeline(&[DutyEvent::new(ts, DutyStatus::Sleeper)], &day());
        assert_eq!(
            timeline.slot(9).unwrap().status,
            SlotStatus::Duty(DutyStatus::Sleeper)
        );
        assert!(timeline.slot(8).unwrap().status.is_unknown());
    }

    #[test]
    fn unsorted_input_gives_same_result() {
        let sorted = vec![
            DutyEvent::new(at(1, 0), DutyStatus::OffDuty),
            DutyEvent::new(at(7, 0), DutyStatus::OnDuty),
            DutyEvent::new(at(8, 0), DutyStatus::Driving),
        ];
        let mut shuffled = sorted.clone();
        shuffled.reverse();
        assert_eq!(
            derive_timeline(&sorted, &day()),
            derive_timeline(&shuffled, &day())
        );
    }

    #[test]
    fn same_timestamp_later_input_wins() {
        let events = vec![
            DutyEvent::new(at(12, 0), DutyStatus::OnDuty),
            DutyEvent::new(at(12, 0), DutyStatus::Driving),
        ];
        let timeline = derive_timeline(&events, &day());
        assert_eq!(timeline.slot(12).unwrap().status, DRIVING);

        let reversed: Vec<_> = events.into_iter().rev().collect();
        let timeline = derive_timeline(&reversed, &day());
        assert_eq!(
            timeline.slot(12).unwrap().status,
            SlotStatus::Duty(DutyStatus::OnDuty)
        );
    }

    #[test]
    fn out_of_window_events_are_excluded() {
        let events = vec![
            raw(at(0, 0) - Duration::hours(2), "DRIVING"),
            raw(at(3, 0), "SLEEPER"),
            raw(at(23, 0) + Duration::hours(2), "ON"),
        ];
        let derivation = derive_hourly_slots(&events, &day());
        assert_eq!(derivation.excluded, 2);
        assert!(derivation.skipped.is_empty());
        assert!(derivation.timeline.slot(2).unwrap().status.is_unknown());
        assert_eq!(
            derivation.timeline.slot(23).unwrap().status,
            SlotStatus::Duty(DutyStatus::Sleeper)
        );
    }

    #[test]
    fn malformed_event_is_skipped_and_reported() {
        let events = vec![
            raw(at(2, 0), "OFF"),
            RawDutyEvent {
                timestamp: Some("2025-01-15 sometime".into()),
                status: Some("DRIVING".into()),
                ..RawDutyEvent::default()
            },
            raw(at(6, 0), "DRIVING"),
            raw(at(11, 0), "ON"),
        ];
        let derivation = derive_hourly_slots(&events, &day());

        assert_eq!(derivation.skipped.len(), 1);
        assert_eq!(derivation.skipped[0].index, 1);
        assert_eq!(derivation.timeline.slot(3).unwrap().status, OFF);
        assert_eq!(derivation.timeline.slot(6).unwrap().status, DRIVING);
        assert_eq!(
            derivation.timeline.slot(11).unwrap().status,
            SlotStatus::Duty(DutyStatus::OnDuty)
        );
    }

    #[test]
    fn slots_echo_representative_event_metadata() {
        let events = vec![
            DutyEvent::new(at(4, 30), DutyStatus::Driving)
                .with_location("Elko, NV")
                .with_odometer(120_450.0)
                .with_engine_hours(3_201.5),
        ];
        let timeline = derive_timeline(&events, &day());
        let slot = timeline.slot(7).unwrap();
        let event = slot.event.as_ref().unwrap();
        assert_eq!(event.timestamp, at(4, 30));
        assert_eq!(event.location.as_deref(), Some("Elko, NV"));
        assert_eq!(event.odometer, Some(120_450.0));
        assert_eq!(slot.source, SlotSource::Derived);
    }

    #[test]
    fn hours_are_in_order() {
        let timeline = derive_timeline(&[DutyEvent::new(at(0, 0), DutyStatus::OffDuty)], &day());
        let hours: Vec<u8> = timeline.iter().map(|s| s.hour).collect();
        assert_eq!(hours, (0..24).collect::<Vec<u8>>());
    }

    #[test]
    fn local_timezone_shifts_slots() {
        let window = DayWindow::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            chrono_tz::America::Chicago,
        );
        // 14:00 UTC is 08:00 CST.
        let timeline = derive_timeline(&[DutyEvent::new(at(14, 0), DutyStatus::Driving)], &window);
        assert!(timeline.slot(7).unwrap().status.is_unknown());
        assert_eq!(timeline.slot(8).unwrap().status, DRIVING);
    }

    #[test]
    fn samples_override_derived_slots() {
        let mut timeline = derive_timeline(&[DutyEvent::new(at(0, 0), DutyStatus::OffDuty)], &day());
        let samples = vec![
            HourlySample {
                hour: 9,
                status: Some("DRIVING".into()),
                start_time: Some(at(9, 10)),
                end_time: Some(at(9, 40)),
                ..HourlySample::default()
            },
            HourlySample {
                hour: 30,
                status: Some("ON".into()),
                ..HourlySample::default()
            },
            HourlySample {
                hour: 10,
                status: Some("NAP".into()),
                ..HourlySample::default()
            },
            HourlySample {
                hour: 11,
                status: Some("unknown".into()),
                ..HourlySample::default()
            },
        ];
        let skipped = apply_hourly_samples(&mut timeline, &samples);

        assert_eq!(skipped.len(), 2);
        assert_eq!(skipped[0].reason, EventError::HourOutOfRange(30));
        assert_eq!(skipped[1].index, 2);

        let nine = timeline.slot(9).unwrap();
        assert_eq!(nine.status, DRIVING);
        assert_eq!(nine.source, SlotSource::Sample);
        assert_eq!(nine.event.as_ref().unwrap().timestamp, at(9, 10));
        assert_eq!(nine.ends_at, Some(at(9, 40)));

        assert_eq!(timeline.slot(10).unwrap().status, OFF);
        assert_eq!(timeline.slot(10).unwrap().source, SlotSource::Derived);
        assert!(timeline.slot(11).unwrap().status.is_unknown());
        assert_eq!(statuses(&timeline).len(), 24);
    }

    #[test]
    fn later_sample_for_same_hour_wins() {
        let mut timeline = HourlyTimeline::unknown();
        let samples = vec![
            HourlySample {
                hour: 5,
                status: Some("ON".into()),
                ..HourlySample::default()
            },
            HourlySample {
                hour: 5,
                status: Some("SB".into()),
                ..HourlySample::default()
            },
        ];
        assert!(apply_hourly_samples(&mut timeline, &samples).is_empty());
        assert_eq!(
            timeline.slot(5).unwrap().status,
            SlotStatus::Duty(DutyStatus::Sleeper)
        );
    }

    #[test]
    fn slot_status_serde() {
        assert_eq!(serde_json::to_string(&SlotStatus::Unknown).unwrap(), "\"UNKNOWN\"");
        assert_eq!(serde_json::to_string(&DRIVING).unwrap(), "\"DRIVING\"");
        let parsed: SlotStatus = serde_json::from_str("\"OFF\"").unwrap();
        assert_eq!(parsed, OFF);
    }
}
