use crate::calendar::{CalendarId, WeekId};
use crate::day::Day;
use std::io;

/// Raised when the numeric part of a textual duration cannot be read.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("failed to parse duration '{input}'")]
pub struct DurationParseError {
    pub input: String,
}

/// Errors raised while building calendars. These signal misuse of the
/// construction API rather than bad input data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    #[error("hours for {day} belong to week {owner}, not week {week}")]
    HoursOwnership { day: Day, owner: WeekId, week: WeekId },

    #[error("unknown week {0}")]
    UnknownWeek(WeekId),

    #[error("unknown calendar {0}")]
    UnknownCalendar(CalendarId),

    #[error("unknown calendar '{0}'")]
    UnknownCalendarName(String),

    #[error("week {week} cannot derive from week {parent}: derivation cycle")]
    WeekCycle { week: WeekId, parent: WeekId },

    #[error("calendar {calendar} cannot derive from calendar {parent}: derivation cycle")]
    CalendarCycle {
        calendar: CalendarId,
        parent: CalendarId,
    },

    #[error("maximum records exceeded: an exception holds at most {max} time ranges")]
    TooManyRanges { max: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),
    #[error("duration error: {0}")]
    Duration(#[from] DurationParseError),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
