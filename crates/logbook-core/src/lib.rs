//! Core domain logic for driver duty logbooks.
//!
//! This crate contains the fundamental types and logic for:
//! - Timeline: deriving the 24 hour slots of a day from duty status changes
//! - Durations: totalling time per duty status, with unknown time kept apart
//! - Window: rolling daily totals up over the last N days

mod batch;
pub mod day;
pub mod duty_status;
mod durations;
pub mod event;
mod timeline;
pub mod types;
mod window;

pub use batch::{DayDerivation, DayInput, derive_day, derive_days};
pub use day::{DayWindow, DriverDay, HOURS_PER_DAY};
pub use duty_status::{DutyStatus, UnknownDutyStatus};
pub use durations::{DAY_MINUTES, DutyDurations, SLOT_MINUTES, UnknownPolicy, compute_durations};
pub use event::{DutyEvent, EventError, RawDutyEvent, SkippedEvent, parse_events};
pub use timeline::{
    Derivation, HourSlot, HourlySample, HourlyTimeline, SlotSource, SlotStatus,
    apply_hourly_samples, derive_hourly_slots, derive_timeline,
};
pub use types::{Certification, DriverId, ValidationError};
pub use window::{DailyLog, DayEntry, MAX_WINDOW_DAYS, WindowSummary, aggregate_over_window};
