//! Duty status enum as the single source of truth for status strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regulatory duty categories a driver can be in.
///
/// The first four are the rows of the logbook grid. The remaining variants are
/// sub-states that roll up into one of those rows (see [`DutyStatus::primary`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DutyStatus {
    OffDuty,
    Sleeper,
    Driving,
    OnDuty,
    YardMove,
    PersonalConveyance,
    PersonalConveyanceDeferred,
}

impl DutyStatus {
    /// Every status, in grid order followed by sub-states.
    pub const ALL: [Self; 7] = [
        Self::OffDuty,
        Self::Sleeper,
        Self::Driving,
        Self::OnDuty,
        Self::YardMove,
        Self::PersonalConveyance,
        Self::PersonalConveyanceDeferred,
    ];

    /// The four grid rows, top to bottom.
    pub const PRIMARY: [Self; 4] = [Self::OffDuty, Self::Sleeper, Self::Driving, Self::OnDuty];

    /// Canonical upper-snake name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OffDuty => "OFF_DUTY",
            Self::Sleeper => "SLEEPER",
            Self::Driving => "DRIVING",
            Self::OnDuty => "ON_DUTY",
            Self::YardMove => "YARD_MOVE",
            Self::PersonalConveyance => "PERSONAL_CONVEYANCE",
            Self::PersonalConveyanceDeferred => "PERSONAL_CONVEYANCE_DEFERRED",
        }
    }

    /// The grid row this status is drawn on.
    ///
    /// Yard moves are on-duty time; personal conveyance is off-duty time.
    #[must_use]
    pub const fn primary(self) -> Self {
        match self {
            Self::YardMove => Self::OnDuty,
            Self::PersonalConveyance | Self::PersonalConveyanceDeferred => Self::OffDuty,
            other => other,
        }
    }

    /// Short label used on the grid axis.
    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self.primary() {
            Self::Sleeper => "SB",
            Self::Driving => "D",
            Self::OnDuty => "ON",
            _ => "OFF",
        }
    }
}

impl fmt::Display for DutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyStatus {
    type Err = UnknownDutyStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "OFF_DUTY" | "OFF" => Ok(Self::OffDuty),
            "SLEEPER" | "SB" | "S" => Ok(Self::Sleeper),
            "DRIVING" | "D" => Ok(Self::Driving),
            "ON_DUTY" | "ON" => Ok(Self::OnDuty),
            "YARD_MOVE" | "YM" => Ok(Self::YardMove),
            "PERSONAL_CONVEYANCE" | "PC" => Ok(Self::PersonalConveyance),
            "PERSONAL_CONVEYANCE_DEFERRED" | "PCD" => Ok(Self::PersonalConveyanceDeferred),
            _ => Err(UnknownDutyStatus(s.to_string())),
        }
    }
}

impl Serialize for DutyStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DutyStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for status strings outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDutyStatus(String);

impl fmt::Display for UnknownDutyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown duty status: {}", self.0)
    }
}

impl std::error::Error for UnknownDutyStatus {}
