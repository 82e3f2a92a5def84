use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Day of the week, numbered 1 (Sunday) to 7 (Saturday).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sunday,
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Zero based slot used by the per-week day arrays.
    pub(crate) fn index(self) -> usize {
        self.value() as usize - 1
    }

    /// Maps a 1..=7 code to a day. Codes outside that range fall back to
    /// Sunday, the first day of the week.
    pub fn from_value(value: i32) -> Day {
        match value {
            1..=7 => Self::ALL[(value - 1) as usize],
            other => {
                tracing::debug!(value = other, "day code out of range, using Sunday");
                Day::Sunday
            }
        }
    }

    pub fn next_day(self) -> Day {
        Self::ALL[self.value() as usize % 7]
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Day::Saturday | Day::Sunday)
    }

    pub fn of_date(date: NaiveDate) -> Day {
        Day::from(date.weekday())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Day::Sunday => "Sunday",
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
        }
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => Day::Sunday,
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
        }
    }
}

impl From<Day> for Weekday {
    fn from(day: Day) -> Self {
        match day {
            Day::Sunday => Weekday::Sun,
            Day::Monday => Weekday::Mon,
            Day::Tuesday => Weekday::Tue,
            Day::Wednesday => Weekday::Wed,
            Day::Thursday => Weekday::Thu,
            Day::Friday => Weekday::Fri,
            Day::Saturday => Weekday::Sat,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Working status flag for a day within a week definition.
///
/// `Default` only has meaning on a derived week, where it defers to the
/// parent week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    NonWorking = 0,
    Working = 1,
    Default = 2,
}

impl DayType {
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Unknown codes fall back to `Default`, which is resolved through the
    /// week hierarchy at lookup time.
    pub fn from_value(value: i32) -> DayType {
        match value {
            0 => DayType::NonWorking,
            1 => DayType::Working,
            2 => DayType::Default,
            other => {
                tracing::debug!(value = other, "day type code out of range, using Default");
                DayType::Default
            }
        }
    }
}

impl From<bool> for DayType {
    fn from(working: bool) -> Self {
        if working {
            DayType::Working
        } else {
            DayType::NonWorking
        }
    }
}
