//! Run clock — the single "now" snapshot shared by every stage of a run.
//!
//! RULE: Nothing in the engine calls the system clock directly.
//! `now` is captured once when a run starts and passed explicitly,
//! so customers scored early and late in a run see the same instant.

use crate::types::{RunId, Timestamp};
use chrono::{Datelike, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunClock {
    pub run_id: RunId,
    now:        Timestamp,
}

impl RunClock {
    /// Snapshot the wall clock. Call once per run.
    pub fn capture() -> Self {
        Self::fixed(Utc::now())
    }

    /// A clock pinned to `now`. Used for reproducible runs and tests.
    pub fn fixed(now: Timestamp) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            now,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Whole days elapsed since `at`. Future instants clamp to 0.
    pub fn days_since(&self, at: Timestamp) -> i64 {
        days_between(at, self.now)
    }
}

/// Whole days from `start` to `end`, never negative.
pub fn days_between(start: Timestamp, end: Timestamp) -> i64 {
    (end - start).num_days().max(0)
}

/// Calendar-month difference, ignoring the day of month.
/// 2024-01-31 → 2024-02-01 is one month.
pub fn months_between(start: Timestamp, end: Timestamp) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}

/// `date` shifted forward by `months` calendar months.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Midnight UTC at the start of `date`.
pub fn start_of_day(date: NaiveDate) -> Timestamp {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
