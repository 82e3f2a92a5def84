pub mod calendar;
pub mod config;
pub mod date_range;
pub mod day;
pub mod duration;
pub mod error;
pub mod persistence;
pub mod recurring;
pub mod timephased;

pub use calendar::{
    CalendarId, CalendarRef, ProjectCalendar, ProjectCalendarException, ProjectCalendarHours,
    ProjectCalendarWeek, ProjectCalendars, WeekId,
};
pub use config::{CalendarConfig, DayConfig, ExceptionConfig, ProjectConfig, WorkWeekConfig};
pub use date_range::{DateRange, TimeRange};
pub use day::{Day, DayType};
pub use duration::{Duration, NumberFormat, TimeUnit, TimeUnitDefaults};
pub use error::{CalendarError, DurationParseError, PersistenceError, PersistenceResult};
pub use persistence::{
    CalendarStore, JsonCalendarStore, load_calendars_from_json, load_config_from_json,
    load_timephased_from_csv, save_calendars_to_json, save_config_to_json, save_timephased_to_csv,
};
pub use recurring::{RecurrencePattern, RecurrenceType, RecurringData, RelativeOrdinal, WeekdaySet};
pub use timephased::{
    MppNormaliser, MspdiNormaliser, TimephasedData, TimephasedFormat, TimephasedNormaliser,
    TimephasedResourceAssignment, convert_to_hours, merge_same_work,
};
