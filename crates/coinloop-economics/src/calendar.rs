//! Calendar boundaries and time sources
//!
//! Day and week boundaries are decided in a fixed UTC offset taken from
//! configuration. Weeks follow ISO-8601: they start on Monday and belong to
//! the ISO week-year, so the last days of December can fall in week 1 of the
//! following year without triggering a spurious reset.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable clock for tests and replaying past days
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to a new instant
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Move forward and return the new instant
    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        let mut now = self.now.lock();
        *now += by;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Calendar settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Offset from UTC, in minutes, of the user's local day
    pub utc_offset_minutes: i32,
}

/// Day/week boundary rules
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// Calendar in UTC
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Calendar from configuration. Out-of-range offsets fall back to UTC.
    pub fn from_config(config: &CalendarConfig) -> Self {
        match FixedOffset::east_opt(config.utc_offset_minutes.saturating_mul(60)) {
            Some(offset) => Self { offset },
            None => {
                tracing::warn!(
                    utc_offset_minutes = config.utc_offset_minutes,
                    "UTC offset out of range, using UTC"
                );
                Self::utc()
            }
        }
    }

    /// Local calendar date of an instant
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    /// ISO-8601 (week-year, week number) of an instant
    pub fn iso_week(&self, at: DateTime<Utc>) -> (i32, u32) {
        let week = self.local_date(at).iso_week();
        (week.year(), week.week())
    }

    /// True if `last_reset` is absent or falls on another local day than `now`
    pub fn needs_daily_reset(
        &self,
        last_reset: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match last_reset {
            None => true,
            Some(last) => self.local_date(last) != self.local_date(now),
        }
    }

    /// True if `last_reset` is absent or falls in another ISO week than `now`
    pub fn needs_weekly_reset(
        &self,
        last_reset: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match last_reset {
            None => true,
            Some(last) => self.iso_week(last) != self.iso_week(now),
        }
    }
}
