use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Builds a time of day from hours and minutes, wrapping past midnight.
pub(crate) fn time_of_day(hour: i64, minute: i64) -> NaiveTime {
    NaiveTime::MIN + TimeDelta::minutes(hour * 60 + minute)
}

pub(crate) fn millis_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1000 + i64::from(time.nanosecond() / 1_000_000)
}

pub(crate) fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Last representable millisecond of `date`.
pub(crate) fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN + TimeDelta::milliseconds(MILLIS_PER_DAY - 1))
}

/// A span between two instants. Used for calendar exception days and for the
/// validity period of a work week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whole-day span: `from` at 00:00 through the last millisecond of `to`.
    pub fn from_days(from: NaiveDate, to: NaiveDate) -> Self {
        Self::new(day_start(from), day_end(to))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Inclusive of both bounds.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start.date() <= date && date <= self.end.date()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} -> {}]", self.start, self.end)
    }
}

/// A working period within a single day. An end of 00:00 means midnight at
/// the end of the day, so `00:00 - 00:00` covers the full 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn from_hm(start_hour: u32, start_minute: u32, end_hour: u32, end_minute: u32) -> Self {
        Self::new(
            time_of_day(i64::from(start_hour), i64::from(start_minute)),
            time_of_day(i64::from(end_hour), i64::from(end_minute)),
        )
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn ends_at_midnight(&self) -> bool {
        self.end == NaiveTime::MIN
    }

    pub(crate) fn start_millis(&self) -> i64 {
        millis_of_day(self.start)
    }

    pub(crate) fn end_millis(&self) -> i64 {
        if self.ends_at_midnight() {
            MILLIS_PER_DAY
        } else {
            millis_of_day(self.end)
        }
    }

    pub fn duration_millis(&self) -> i64 {
        (self.end_millis() - self.start_millis()).max(0)
    }

    /// Length of the intersection with `[from, to)`, both in milliseconds
    /// since midnight.
    pub(crate) fn overlap_millis(&self, from: i64, to: i64) -> i64 {
        let start = self.start_millis().max(from);
        let end = self.end_millis().min(to);
        (end - start).max(0)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}
