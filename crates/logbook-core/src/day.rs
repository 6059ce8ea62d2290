//! Calendar-day windows in a driver's reference timezone.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::types::DriverId;

/// Number of hour slots in a logbook day.
pub const HOURS_PER_DAY: usize = 24;

/// How to resolve a local time that occurs twice during a DST fall-back.
#[derive(Debug, Clone, Copy)]
enum Fold {
    Earliest,
    Latest,
}

/// One calendar date in a reference timezone.
///
/// Covers local `00:00:00.000` through `23:59:59.999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayWindow {
    pub date: NaiveDate,
    pub tz: Tz,
}

impl DayWindow {
    pub const fn new(date: NaiveDate, tz: Tz) -> Self {
        Self { date, tz }
    }

    /// A window whose reference timezone is UTC.
    pub const fn utc(date: NaiveDate) -> Self {
        Self { date, tz: Tz::UTC }
    }

    /// First instant of the day.
    pub fn start(&self) -> DateTime<Utc> {
        self.resolve(self.date.and_time(NaiveTime::MIN), Fold::Earliest)
    }

    /// Last instant of the day (`23:59:59.999` local).
    pub fn end(&self) -> DateTime<Utc> {
        self.slot_end(HOURS_PER_DAY - 1)
    }

    /// Last instant of hour `hour` (`hour:59:59.999` local).
    ///
    /// Hours that fall inside a DST gap share the end of the hour before
    /// the gap, so slots stay monotonic.
    pub fn slot_end(&self, hour: usize) -> DateTime<Utc> {
        let hour = u32::try_from(hour.min(HOURS_PER_DAY - 1)).unwrap_or(23);
        let local = NaiveTime::from_hms_milli_opt(hour, 59, 59, 999)
            .map_or_else(|| self.date.and_time(NaiveTime::MIN), |t| self.date.and_time(t));
        self.resolve(local, Fold::Latest)
    }

    /// Whether `instant` falls inside this day.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant <= self.end()
    }

    /// The same window shifted by `days` calendar days.
    #[must_use]
    pub fn offset_days(&self, days: i64) -> Self {
        Self {
            date: self.date + Duration::days(days),
            tz: self.tz,
        }
    }

    fn resolve(&self, local: NaiveDateTime, fold: Fold) -> DateTime<Utc> {
        match self.tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(early, late) => match fold {
                Fold::Earliest => early.with_timezone(&Utc),
                Fold::Latest => late.with_timezone(&Utc),
            },
            LocalResult::None => {
                // Inside a spring-forward gap: look an hour later, then step
                // back the same hour in absolute time.
                let shifted = local + Duration::hours(1);
                match self.tz.from_local_datetime(&shifted) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                        dt.with_timezone(&Utc) - Duration::hours(1)
                    }
                    LocalResult::None => Utc.from_utc_datetime(&local),
                }
            }
        }
    }
}

/// The unit one timeline is derived for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DriverDay {
    pub driver: DriverId,
    pub window: DayWindow,
}

impl DriverDay {
    pub const fn new(driver: DriverId, window: DayWindow) -> Self {
        Self { driver, window }
    }
}
