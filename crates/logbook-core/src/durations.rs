//! Duty-category duration totals.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::duty_status::DutyStatus;
use crate::timeline::{HourlyTimeline, SlotStatus};

/// Minutes covered by one hour slot.
pub const SLOT_MINUTES: i64 = 60;

/// Minutes in one logbook day.
pub const DAY_MINUTES: i64 = 24 * SLOT_MINUTES;

/// How hours with no recorded status are reported.
///
/// Whether unrecorded time should legally count as off duty is a policy
/// decision, so both views are available and `Distinct` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Keep unknown time as its own bucket.
    #[default]
    Distinct,
    /// Report unknown time as off duty.
    CountAsOffDuty,
}

impl UnknownPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Distinct => "distinct",
            Self::CountAsOffDuty => "count_as_off_duty",
        }
    }
}

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnknownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "distinct" => Ok(Self::Distinct),
            "count_as_off_duty" | "off_duty" => Ok(Self::CountAsOffDuty),
            other => Err(format!("unknown policy: {other}")),
        }
    }
}

/// Minutes attributed to each duty status, plus unknown minutes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyDurations {
    /// Non-zero totals only.
    #[serde(default)]
    by_status: BTreeMap<DutyStatus, i64>,
    #[serde(default)]
    unknown_minutes: i64,
}

impl DutyDurations {
    /// Adds `minutes` to `status`.
    pub fn record(&mut self, status: SlotStatus, minutes: i64) {
        if minutes == 0 {
            return;
        }
        match status {
            SlotStatus::Duty(duty) => *self.by_status.entry(duty).or_insert(0) += minutes,
            SlotStatus::Unknown => self.unknown_minutes += minutes,
        }
    }

    /// Minutes recorded for `status`.
    pub fn minutes(&self, status: DutyStatus) -> i64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn get(&self, status: DutyStatus) -> Duration {
        Duration::minutes(self.minutes(status))
    }

    pub const fn unknown_minutes(&self) -> i64 {
        self.unknown_minutes
    }

    pub fn unknown(&self) -> Duration {
        Duration::minutes(self.unknown_minutes)
    }

    /// All minutes, known and unknown.
    pub fn total_minutes(&self) -> i64 {
        self.by_status.values().sum::<i64>() + self.unknown_minutes
    }

    pub fn total(&self) -> Duration {
        Duration::minutes(self.total_minutes())
    }

    /// Iterates statuses with non-zero time, in grid order.
    pub fn iter(&self) -> impl Iterator<Item = (DutyStatus, i64)> + '_ {
        self.by_status.iter().map(|(status, minutes)| (*status, *minutes))
    }

    /// Folds sub-states into the four grid rows.
    #[must_use]
    pub fn by_primary(&self) -> Self {
        let mut rolled = Self {
            by_status: BTreeMap::new(),
            unknown_minutes: self.unknown_minutes,
        };
        for (status, minutes) in self.iter() {
            rolled.record(SlotStatus::Duty(status.primary()), minutes);
        }
        rolled
    }

    /// Applies `policy` to the unknown bucket.
    #[must_use]
    pub fn with_unknown_policy(&self, policy: UnknownPolicy) -> Self {
        match policy {
            UnknownPolicy::Distinct => self.clone(),
            UnknownPolicy::CountAsOffDuty => {
                let mut out = self.clone();
                let unknown = std::mem::take(&mut out.unknown_minutes);
                out.record(SlotStatus::Duty(DutyStatus::OffDuty), unknown);
                out
            }
        }
    }
}

impl AddAssign<&Self> for DutyDurations {
    fn add_assign(&mut self, rhs: &Self) {
        for (status, minutes) in rhs.iter() {
            self.record(SlotStatus::Duty(status), minutes);
        }
        self.unknown_minutes += rhs.unknown_minutes;
    }
}

impl Add for DutyDurations {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += &rhs;
        self
    }
}

impl<'a> Sum<&'a Self> for DutyDurations {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, d| {
            acc += d;
            acc
        })
    }
}

/// Totals the time in each status across the day's slots.
///
/// Every slot contributes one hour, so the result always sums to 24h.
pub fn compute_durations(timeline: &HourlyTimeline) -> DutyDurations {
    let mut durations = DutyDurations::default();
    for slot in timeline {
        durations.record(slot.status, SLOT_MINUTES);
    }
    durations
}
