//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An hour-of-day outside 0..=23.
    #[error("hour must be between 0 and 23, got {value}")]
    HourOutOfRange { value: i64 },

    /// Invalid certification value.
    #[error("invalid certification state: {value}")]
    InvalidCertification { value: String },
}

/// Day-level attestation that the driver confirmed the log.
///
/// Certified is terminal for the day. Whether an edited log must be
/// re-certified is decided by whoever persists this flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Certification {
    #[default]
    Uncertified,
    Certified,
}

impl Certification {
    /// String representation for display and storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uncertified => "uncertified",
            Self::Certified => "certified",
        }
    }

    /// Returns true once the day has been certified.
    #[must_use]
    pub const fn is_certified(self) -> bool {
        matches!(self, Self::Certified)
    }

    /// Transitions to `Certified`. Already-certified days stay certified.
    #[must_use]
    pub const fn certify(self) -> Self {
        Self::Certified
    }
}

impl From<bool> for Certification {
    fn from(certified: bool) -> Self {
        if certified {
            Self::Certified
        } else {
            Self::Uncertified
        }
    }
}

impl fmt::Display for Certification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Certification {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "certified" => Ok(Self::Certified),
            "uncertified" => Ok(Self::Uncertified),
            _ => Err(ValidationError::InvalidCertification {
                value: s.to_string(),
            }),
        }
    }
}

/// A driver identifier as issued by the event source.
///
/// Surrounding whitespace is dropped; a blank ID is rejected. Uniqueness is
/// the event source's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DriverId(String);

impl DriverId {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "driver ID" });
        }
        if trimmed.len() == id.len() {
            Ok(Self(id))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DriverId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DriverId> for String {
    fn from(id: DriverId) -> Self {
        id.0
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_id_rejects_blank() {
        assert!(DriverId::new("").is_err());
        assert!(DriverId::new("   ").is_err());
        assert!(DriverId::new("drv-42").is_ok());
    }

    #[test]
    fn driver_id_drops_surrounding_whitespace() {
        let id = DriverId::new("  drv-42\n").unwrap();
        assert_eq!(id.as_str(), "drv-42");
        assert_eq!(id.to_string(), "drv-42");
    }

    #[test]
    fn driver_id_serde_roundtrip() {
        let id = DriverId::new("drv-42").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"drv-42\"");
        let parsed: DriverId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<DriverId>("\"\"").is_err());
    }

    #[test]
    fn certification_is_terminal() {
        let day = Certification::default();
        assert!(!day.is_certified());
        let day = day.certify();
        assert!(day.is_certified());
        assert_eq!(day.certify(), Certification::Certified);
    }

    #[test]
    fn certification_from_flag() {
        assert_eq!(Certification::from(true), Certification::Certified);
        assert_eq!(Certification::from(false), Certification::Uncertified);
    }

    #[test]
    fn certification_from_str() {
        assert_eq!(
            "certified".parse::<Certification>().unwrap(),
            Certification::Certified
        );
        assert!("maybe".parse::<Certification>().is_err());
    }

    #[test]
    fn certification_serde() {
        let json = serde_json::to_string(&Certification::Uncertified).unwrap();
        assert_eq!(json, "\"uncertified\"");
    }
}
