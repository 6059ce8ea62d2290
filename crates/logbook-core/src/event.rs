//! Duty status change events, raw and validated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duty_status::{DutyStatus, UnknownDutyStatus};

/// Why a single event could not be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("missing timestamp")]
    MissingTimestamp,

    #[error("invalid timestamp {value:?}: {source}")]
    InvalidTimestamp {
        value: String,
        source: chrono::ParseError,
    },

    #[error("missing status")]
    MissingStatus,

    #[error(transparent)]
    UnknownStatus(#[from] UnknownDutyStatus),

    #[error("hour must be between 0 and 23, got {0}")]
    HourOutOfRange(i64),

    /// The record was not even well-formed JSON.
    #[error("unreadable record: {0}")]
    Unreadable(String),
}

/// An event that was dropped from derivation, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    pub index: usize,
    pub reason: EventError,
}

/// An event as delivered by the event source, before validation.
///
/// Field names follow the upstream API, which is not consistent about
/// `time`/`event_time` or `engine_hours`/`engineHours`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDutyEvent {
    #[serde(default, alias = "event_time", alias = "time")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
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

impl RawDutyEvent {
    /// Validates the timestamp and status.
    pub fn parse(&self) -> Result<DutyEvent, EventError> {
        let raw_ts = self
            .timestamp
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(EventError::MissingTimestamp)?;
        let timestamp = DateTime::parse_from_rfc3339(raw_ts)
            .map_err(|source| EventError::InvalidTimestamp {
                value: raw_ts.to_string(),
                source,
            })?
            .with_timezone(&Utc);

        let status: DutyStatus = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(EventError::MissingStatus)?
            .parse()?;

        Ok(DutyEvent {
            timestamp,
            status,
            location: self.location.clone(),
            odometer: self.odometer,
            engine_hours: self.engine_hours,
        })
    }
}

/// A validated status change: `status` became active at `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyEvent {
    pub timestamp: DateTime<Utc>,
    pub status: DutyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_hours: Option<f64>,
}

impl DutyEvent {
    /// Creates an event with no display metadata.
    pub const fn new(timestamp: DateTime<Utc>, status: DutyStatus) -> Self {
        Self {
            timestamp,
            status,
            location: None,
            odometer: None,
            engine_hours: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub const fn with_odometer(mut self, odometer: f64) -> Self {
        self.odometer = Some(odometer);
        self
    }

    #[must_use]
    pub const fn with_engine_hours(mut self, engine_hours: f64) -> Self {
        self.engine_hours = Some(engine_hours);
        self
    }
}

/// Parses every raw event, keeping the good ones and recording the rest.
///
/// Returned events keep their input order.
pub fn parse_events(raw: &[RawDutyEvent]) -> (Vec<DutyEvent>, Vec<SkippedEvent>) {
    let mut events = Vec::with_capacity(raw.len());
    let mut skipped = Vec::new();

    for (index, record) in raw.iter().enumerate() {
        match record.parse() {
            Ok(event) => events.push(event),
            Err(reason) => {
                tracing::warn!(index, error = %reason, "skipping malformed duty event");
                skipped.push(SkippedEvent { index, reason });
            }
        }
    }

    (events, skipped)
}
