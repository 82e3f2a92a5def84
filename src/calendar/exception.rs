use crate::date_range::{DateRange, TimeRange, day_end, day_start};
use crate::error::CalendarError;
use crate::recurring::RecurringData;
use chrono::{NaiveDate, NaiveDateTime};

/// Most working periods a single exception can carry.
pub const MAX_EXCEPTION_RANGES: usize = 5;

/// A dated override of the normal working week. An exception with no
/// ranges marks its days as non-working.
///
/// Bounds are normalised to whole days: `from` starts at 00:00 and `to`
/// ends on the last millisecond of its day.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCalendarException {
    name: Option<String>,
    range: DateRange,
    ranges: Vec<TimeRange>,
    recurring: Option<RecurringData>,
}

impl ProjectCalendarException {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self::from_dates(from.date(), to.date())
    }

    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            name: None,
            range: DateRange::new(day_start(from), day_end(to)),
            ranges: Vec::new(),
            recurring: None,
        }
    }

    /// A single-day exception.
    pub fn on(date: NaiveDate) -> Self {
        Self::from_dates(date, date)
    }

    pub fn recurring(recurring: RecurringData) -> Self {
        let start = recurring.start_date;
        let finish = recurring.finish_date.unwrap_or(start);
        let mut exception = Self::from_dates(start, finish.max(start));
        exception.recurring = Some(recurring);
        exception
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Result<Self, CalendarError> {
        self.add_range(range)?;
        Ok(self)
    }

    pub fn add_range(&mut self, range: TimeRange) -> Result<(), CalendarError> {
        if self.ranges.len() >= MAX_EXCEPTION_RANGES {
            return Err(CalendarError::TooManyRanges {
                max: MAX_EXCEPTION_RANGES,
            });
        }
        self.ranges.push(range);
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn from_date(&self) -> NaiveDateTime {
        self.range.start()
    }

    pub fn to_date(&self) -> NaiveDateTime {
        self.range.end()
    }

    pub fn date_range(&self) -> &DateRange {
        &self.range
    }

    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    pub fn working(&self) -> bool {
        !self.ranges.is_empty()
    }

    pub fn recurrence(&self) -> Option<&RecurringData> {
        self.recurring.as_ref()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurring.is_some()
    }

    /// Inclusive of both bounds.
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.range.contains(instant)
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.range.contains_date(date)
    }

    /// One single-day exception per generated date for a recurring
    /// exception, or a copy of itself otherwise.
    pub fn expanded(&self) -> Vec<ProjectCalendarException> {
        match &self.recurring {
            None => vec![self.clone()],
            Some(recurring) => recurring
                .dates()
                .into_iter()
                .map(|date| ProjectCalendarException {
                    name: self.name.clone(),
                    range: DateRange::from_days(date, date),
                    ranges: self.ranges.clone(),
                    recurring: None,
                })
                .collect(),
        }
    }
}
