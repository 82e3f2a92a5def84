use super::hours::ProjectCalendarHours;
use crate::date_range::{DateRange, TimeRange};
use crate::day::{Day, DayType};
use crate::error::CalendarError;
use std::fmt;

/// Handle to a week stored in a [`super::ProjectCalendars`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekId(usize);

impl WeekId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub fn default_working_morning() -> TimeRange {
    TimeRange::from_hm(8, 0, 12, 0)
}

pub fn default_working_afternoon() -> TimeRange {
    TimeRange::from_hm(13, 0, 17, 0)
}

/// Default working periods: 08:00-12:00 and 13:00-17:00 on weekdays,
/// nothing at weekends.
pub fn default_hours(day: Day) -> Vec<TimeRange> {
    if day.is_weekend() {
        Vec::new()
    } else {
        vec![default_working_morning(), default_working_afternoon()]
    }
}

/// Day type a base week assumes when nothing more specific is known.
pub(crate) fn base_day_type(day: Day) -> DayType {
    DayType::from(!day.is_weekend())
}

/// A working-week template: one day-type flag and one optional set of hours
/// per day of the week.
///
/// A week with a parent is derived. Its unset flags read as
/// [`DayType::Default`] and missing hours are taken from the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCalendarWeek {
    id: WeekId,
    name: Option<String>,
    date_range: Option<DateRange>,
    parent: Option<WeekId>,
    hours: [Option<ProjectCalendarHours>; 7],
    days: [Option<DayType>; 7],
}

impl ProjectCalendarWeek {
    pub(crate) fn new(id: WeekId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            date_range: None,
            parent: None,
            hours: Default::default(),
            days: [None; 7],
        }
    }

    pub fn id(&self) -> WeekId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    pub fn set_date_range(&mut self, range: Option<DateRange>) {
        self.date_range = range;
    }

    pub fn parent(&self) -> Option<WeekId> {
        self.parent
    }

    pub fn is_derived(&self) -> bool {
        self.parent.is_some()
    }

    /// Links the week to its parent. Cycle checks live in the arena, which
    /// is the only caller.
    pub(crate) fn set_parent(&mut self, parent: Option<WeekId>) {
        self.parent = parent;
        for (day, flag) in Day::ALL.into_iter().zip(self.days.iter_mut()) {
            match (parent, *flag) {
                (Some(_), None) => *flag = Some(DayType::Default),
                (None, Some(DayType::Default)) => *flag = Some(base_day_type(day)),
                _ => {}
            }
        }
    }

    /// Creates hours owned by this week without attaching them.
    pub fn new_hours(&self, day: Day) -> ProjectCalendarHours {
        ProjectCalendarHours::new(self.id, day)
    }

    /// Creates empty hours for `day`, replacing whatever was attached.
    pub fn add_calendar_hours(&mut self, day: Day) -> &mut ProjectCalendarHours {
        self.hours[day.index()].insert(ProjectCalendarHours::new(self.id, day))
    }

    /// Hours attached directly to this week, ignoring any parent.
    pub fn calendar_hours(&self, day: Day) -> Option<&ProjectCalendarHours> {
        self.hours[day.index()].as_ref()
    }

    pub fn calendar_hours_mut(&mut self, day: Day) -> Option<&mut ProjectCalendarHours> {
        self.hours[day.index()].as_mut()
    }

    pub fn all_hours(&self) -> &[Option<ProjectCalendarHours>; 7] {
        &self.hours
    }

    /// Stores `hours` in the slot for its day, returning the hours it
    /// replaced. Hours created by another week are rejected.
    pub fn attach_hours_to_day(
        &mut self,
        hours: ProjectCalendarHours,
    ) -> Result<Option<ProjectCalendarHours>, CalendarError> {
        self.check_owner(&hours)?;
        Ok(self.hours[hours.day().index()].replace(hours))
    }

    /// Clears the slot for the day of `hours`, returning what was stored.
    pub fn remove_hours_from_day(
        &mut self,
        hours: &ProjectCalendarHours,
    ) -> Result<Option<ProjectCalendarHours>, CalendarError> {
        self.check_owner(hours)?;
        Ok(self.hours[hours.day().index()].take())
    }

    fn check_owner(&self, hours: &ProjectCalendarHours) -> Result<(), CalendarError> {
        if hours.parent_week() != self.id {
            return Err(CalendarError::HoursOwnership {
                day: hours.day(),
                owner: hours.parent_week(),
                week: self.id,
            });
        }
        Ok(())
    }

    pub fn add_default_calendar_hours(&mut self) {
        for day in Day::ALL {
            self.add_default_calendar_hours_for(day);
        }
    }

    pub fn add_default_calendar_hours_for(&mut self, day: Day) {
        let hours = self.add_calendar_hours(day);
        for range in default_hours(day) {
            hours.add_range(range);
        }
    }

    pub fn days(&self) -> &[Option<DayType>; 7] {
        &self.days
    }

    /// The flag stored for `day`, without resolving `Default`.
    pub fn working_day(&self, day: Day) -> Option<DayType> {
        self.days[day.index()]
    }

    /// Stores a day flag. Clearing the flag stores `Default` on a derived
    /// week and `Working` on a base week. A base week never keeps
    /// `Default`: it is replaced by the weekday rule.
    pub fn set_working_day(&mut self, day: Day, day_type: Option<DayType>) {
        let value = match (day_type, self.is_derived()) {
            (None, true) => DayType::Default,
            (None, false) => DayType::Working,
            (Some(DayType::Default), false) => base_day_type(day),
            (Some(value), _) => value,
        };
        self.days[day.index()] = Some(value);
    }

    pub fn set_working(&mut self, day: Day, working: bool) {
        self.set_working_day(day, Some(DayType::from(working)));
    }
}
