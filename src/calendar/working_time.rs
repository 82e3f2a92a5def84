use super::{CalendarId, ProjectCalendar, ProjectCalendarException, ProjectCalendars, WeekId};
use crate::date_range::{MILLIS_PER_DAY, TimeRange, millis_of_day};
use crate::day::{Day, DayType};
use crate::duration::{Duration, TimeUnit, TimeUnitDefaults};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::borrow::Cow;

/// How far ahead searches for the next working period look before giving
/// up.
pub const MAX_NONWORKING_DAYS: usize = 1000;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// A calendar resolved against its arena, answering working-time queries.
#[derive(Debug, Clone, Copy)]
pub struct CalendarRef<'a> {
    store: &'a ProjectCalendars,
    id: CalendarId,
}

impl<'a> CalendarRef<'a> {
    pub(super) fn new(store: &'a ProjectCalendars, id: CalendarId) -> Self {
        Self { store, id }
    }

    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn calendar(&self) -> &'a ProjectCalendar {
        &self.store.calendars[self.id.index()]
    }

    pub fn name(&self) -> &'a str {
        self.calendar().name()
    }

    pub fn parent(&self) -> Option<CalendarRef<'a>> {
        self.calendar()
            .parent()
            .map(|parent| CalendarRef::new(self.store, parent))
    }

    /// Conversion settings: the calendar's own, then its ancestors', then
    /// the project's.
    pub fn defaults(&self) -> TimeUnitDefaults {
        match self.calendar().defaults() {
            Some(defaults) => *defaults,
            None => self
                .parent()
                .map_or(*self.store.defaults(), |parent| parent.defaults()),
        }
    }

    /// The exception covering `date`, looking at ancestors when this
    /// calendar has none.
    pub fn exception(&self, date: NaiveDate) -> Option<&'a ProjectCalendarException> {
        self.calendar()
            .exception_on(date)
            .or_else(|| self.parent().and_then(|parent| parent.exception(date)))
    }

    /// The dated work week covering `date`, looking at ancestors when this
    /// calendar has none.
    pub fn work_week(&self, date: NaiveDate) -> Option<WeekId> {
        self.calendar()
            .work_weeks()
            .iter()
            .copied()
            .find(|id| {
                self.store.weeks[id.index()]
                    .date_range()
                    .is_some_and(|range| range.contains_date(date))
            })
            .or_else(|| self.parent().and_then(|parent| parent.work_week(date)))
    }

    pub fn day_type(&self, day: Day) -> DayType {
        self.store.day_type(self.calendar().week(), day)
    }

    pub fn is_working_day(&self, day: Day) -> bool {
        self.day_type(day) == DayType::Working
    }

    /// Hours of the main week for `day`, ignoring exceptions and work
    /// weeks.
    pub fn hours(&self, day: Day) -> Cow<'a, [TimeRange]> {
        self.store.week_ranges(self.calendar().week(), day)
    }

    /// Working periods on `date`: an exception wins, then a dated work
    /// week, then the main week.
    pub fn ranges(&self, date: NaiveDate) -> Cow<'a, [TimeRange]> {
        if let Some(exception) = self.exception(date) {
            return Cow::Borrowed(exception.ranges());
        }
        let week = self.work_week(date).unwrap_or(self.calendar().week());
        self.store.week_ranges(week, Day::of_date(date))
    }

    pub fn is_working_date(&self, date: NaiveDate) -> bool {
        self.ranges(date).iter().any(|range| range.duration_millis() > 0)
    }

    /// Earliest start of work on `date`.
    pub fn start_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        self.ranges(date)
            .iter()
            .filter(|range| range.duration_millis() > 0)
            .min_by_key(|range| range.start_millis())
            .map(TimeRange::start)
    }

    /// Latest end of work on `date`. 00:00 means midnight at the end of
    /// the day.
    pub fn finish_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        self.ranges(date)
            .iter()
            .filter(|range| range.duration_millis() > 0)
            .max_by_key(|range| range.end_millis())
            .map(TimeRange::end)
    }

    pub fn start_instant(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        self.start_time(date).map(|time| date.and_time(time))
    }

    /// Latest end of work on `date` as an instant. A midnight finish lands
    /// on the following day.
    pub fn finish_instant(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        let finish = self.finish_time(date)?;
        if finish == NaiveTime::MIN {
            date.succ_opt().map(|next| next.and_time(finish))
        } else {
            Some(date.and_time(finish))
        }
    }

    /// Total working time on `date`.
    pub fn work_on_date(&self, date: NaiveDate, units: TimeUnit) -> Duration {
        self.to_duration(day_millis(&self.ranges(date), 0, MILLIS_PER_DAY), units)
    }

    /// Working time between two instants. The result is negative when
    /// `end` precedes `start`.
    pub fn work(&self, start: NaiveDateTime, end: NaiveDateTime, units: TimeUnit) -> Duration {
        let (from, to, invert) = if end < start {
            (end, start, true)
        } else {
            (start, end, false)
        };

        let from_date = from.date();
        let to_date = to.date();
        let from_millis = millis_of_day(from.time());
        let to_millis = millis_of_day(to.time());

        let total = if from_date == to_date {
            day_millis(&self.ranges(from_date), from_millis, to_millis)
        } else {
            let first = day_millis(&self.ranges(from_date), from_millis, MILLIS_PER_DAY);
            let middle: i64 = from_date
                .iter_days()
                .skip(1)
                .take_while(|date| *date < to_date)
                .map(|date| day_millis(&self.ranges(date), 0, MILLIS_PER_DAY))
                .sum();
            let last = day_millis(&self.ranges(to_date), 0, to_millis);
            first + middle + last
        };

        let duration = self.to_duration(total, units);
        if invert { duration.negate() } else { duration }
    }

    /// Number of working dates in `[start, end]`.
    pub fn duration_in_days(&self, start: NaiveDate, end: NaiveDate) -> Duration {
        let count = start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| self.is_working_date(*date))
            .count();
        Duration::new(count as f64, TimeUnit::Days)
    }

    /// `instant` itself when it falls inside a working period, otherwise
    /// the start of the next one. Returns `instant` unchanged if nothing is
    /// found within [`MAX_NONWORKING_DAYS`].
    pub fn next_work_start(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let date = instant.date();
        let millis = millis_of_day(instant.time());
        if let Some(range) = self
            .ranges(date)
            .iter()
            .filter(|range| range.end_millis() > millis && range.duration_millis() > 0)
            .min_by_key(|range| range.start_millis())
        {
            return if range.start_millis() <= millis {
                instant
            } else {
                date.and_time(range.start())
            };
        }

        date.iter_days()
            .skip(1)
            .take(MAX_NONWORKING_DAYS)
            .filter(|next| self.is_working_date(*next))
            .find_map(|next| self.start_instant(next))
            .unwrap_or_else(|| {
                tracing::debug!(%instant, calendar = self.name(), "no working time ahead");
                instant
            })
    }

    fn to_duration(&self, millis: i64, units: TimeUnit) -> Duration {
        let hours = millis as f64 / MILLIS_PER_HOUR;
        Duration::convert(hours, TimeUnit::Hours, units, &self.defaults())
    }
}

/// Working milliseconds of `ranges` falling inside `[from, to)`.
fn day_millis(ranges: &[TimeRange], from: i64, to: i64) -> i64 {
    if to <= from {
        return 0;
    }
    ranges.iter().map(|range| range.overlap_millis(from, to)).sum()
}
