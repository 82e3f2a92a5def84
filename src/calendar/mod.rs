mod exception;
mod hours;
mod week;
mod working_time;

pub use exception::{MAX_EXCEPTION_RANGES, ProjectCalendarException};
pub use hours::ProjectCalendarHours;
pub use week::{
    ProjectCalendarWeek, WeekId, default_hours, default_working_afternoon, default_working_morning,
};
pub use working_time::{CalendarRef, MAX_NONWORKING_DAYS};

use crate::date_range::{DateRange, TimeRange};
use crate::day::{Day, DayType};
use crate::duration::TimeUnitDefaults;
use crate::error::CalendarError;
use crate::recurring::RecurrenceType;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Handle to a calendar stored in a [`ProjectCalendars`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarId(usize);

impl CalendarId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Order in which recurring exceptions are laid down. A later kind wins
/// over an earlier one on the same date.
const RECURRENCE_PRIORITY: [RecurrenceType; 4] = [
    RecurrenceType::Weekly,
    RecurrenceType::Monthly,
    RecurrenceType::Yearly,
    RecurrenceType::Daily,
];

/// A named calendar: a main working week, optional dated work weeks and
/// exceptions, and an optional parent calendar it derives from.
#[derive(Debug, Clone)]
pub struct ProjectCalendar {
    id: CalendarId,
    name: String,
    week: WeekId,
    work_weeks: Vec<WeekId>,
    exceptions: Vec<ProjectCalendarException>,
    expanded: Vec<ProjectCalendarException>,
    parent: Option<CalendarId>,
    defaults: Option<TimeUnitDefaults>,
}

impl ProjectCalendar {
    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The main working week.
    pub fn week(&self) -> WeekId {
        self.week
    }

    /// Dated work weeks, ordered by start date.
    pub fn work_weeks(&self) -> &[WeekId] {
        &self.work_weeks
    }

    pub fn parent(&self) -> Option<CalendarId> {
        self.parent
    }

    pub fn is_derived(&self) -> bool {
        self.parent.is_some()
    }

    /// Calendar-specific conversion settings, if any.
    pub fn defaults(&self) -> Option<&TimeUnitDefaults> {
        self.defaults.as_ref()
    }

    pub fn set_defaults(&mut self, defaults: Option<TimeUnitDefaults>) {
        self.defaults = defaults;
    }

    /// Exceptions as they were added, ordered by start date.
    pub fn exceptions(&self) -> &[ProjectCalendarException] {
        &self.exceptions
    }

    /// Exceptions with recurring entries expanded to single days and
    /// overlaps resolved, ordered by start date.
    pub fn expanded_exceptions(&self) -> &[ProjectCalendarException] {
        &self.expanded
    }

    pub fn add_exception(&mut self, exception: ProjectCalendarException) {
        self.exceptions.push(exception);
        self.exceptions.sort_by_key(|e| e.from_date());
        self.rebuild_expanded();
    }

    pub fn remove_exception(&mut self, index: usize) -> Option<ProjectCalendarException> {
        if index >= self.exceptions.len() {
            return None;
        }
        let removed = self.exceptions.remove(index);
        self.rebuild_expanded();
        Some(removed)
    }

    pub fn clear_exceptions(&mut self) {
        self.exceptions.clear();
        self.expanded.clear();
    }

    /// The exception covering `date` on this calendar alone. When
    /// exceptions nest, the one starting latest wins.
    pub fn exception_on(&self, date: chrono::NaiveDate) -> Option<&ProjectCalendarException> {
        let end = self.expanded.partition_point(|e| e.from_date().date() <= date);
        self.expanded[..end].iter().rev().find(|e| e.contains_date(date))
    }

    fn rebuild_expanded(&mut self) {
        // Anything expanding to a single entry ranks above every recurrence.
        let mut single = Vec::new();
        let mut repeating = Vec::new();
        for exception in &self.exceptions {
            let mut days = exception.expanded();
            if days.len() == 1 {
                single.append(&mut days);
            } else if let Some(recurring) = exception.recurrence() {
                repeating.push((recurring.recurrence_type(), days));
            }
        }

        let mut by_start: BTreeMap<chrono::NaiveDateTime, ProjectCalendarException> = BTreeMap::new();
        for kind in RECURRENCE_PRIORITY {
            for (_, days) in repeating.iter_mut().filter(|(k, _)| *k == kind) {
                for day in days.drain(..) {
                    by_start.insert(day.from_date(), day);
                }
            }
        }
        by_start.retain(|_, day| {
            !single
                .iter()
                .any(|e| day.from_date() <= e.to_date() && day.to_date() >= e.from_date())
        });

        let mut expanded: Vec<_> = by_start.into_values().chain(single).collect();
        expanded.sort_by_key(|e| e.from_date());
        self.expanded = expanded;
        debug!(
            calendar = %self.name,
            exceptions = self.exceptions.len(),
            expanded = self.expanded.len(),
            "rebuilt expanded exceptions"
        );
    }
}

/// Owns every week and calendar of a project. Weeks and calendars refer to
/// each other through [`WeekId`] and [`CalendarId`] handles.
#[derive(Debug, Clone, Default)]
pub struct ProjectCalendars {
    weeks: Vec<ProjectCalendarWeek>,
    calendars: Vec<ProjectCalendar>,
    defaults: TimeUnitDefaults,
}

impl ProjectCalendars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: TimeUnitDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Project-wide conversion settings.
    pub fn defaults(&self) -> &TimeUnitDefaults {
        &self.defaults
    }

    pub fn set_defaults(&mut self, defaults: TimeUnitDefaults) {
        self.defaults = defaults;
    }

    // Weeks

    pub fn add_week(&mut self, name: Option<String>) -> WeekId {
        let id = WeekId::from_index(self.weeks.len());
        self.weeks.push(ProjectCalendarWeek::new(id, name));
        id
    }

    pub fn week(&self, id: WeekId) -> Result<&ProjectCalendarWeek, CalendarError> {
        self.weeks.get(id.index()).ok_or(CalendarError::UnknownWeek(id))
    }

    pub fn week_mut(&mut self, id: WeekId) -> Result<&mut ProjectCalendarWeek, CalendarError> {
        self.weeks
            .get_mut(id.index())
            .ok_or(CalendarError::UnknownWeek(id))
    }

    pub fn weeks(&self) -> &[ProjectCalendarWeek] {
        &self.weeks
    }

    /// Makes `week` derive from `parent`. Unset day flags become `Default`.
    pub fn set_week_parent(&mut self, week: WeekId, parent: Option<WeekId>) -> Result<(), CalendarError> {
        self.week(week)?;
        if let Some(parent) = parent {
            let mut current = Some(parent);
            while let Some(id) = current {
                if id == week {
                    return Err(CalendarError::WeekCycle { week, parent });
                }
                current = self.week(id)?.parent();
            }
        }
        self.week_mut(week)?.set_parent(parent);
        Ok(())
    }

    /// The hours governing `day` for `week`, walking up the parent chain.
    ///
    /// When no week in the chain has hours for the day, default hours are
    /// attached to the base week and returned.
    pub fn hours(&mut self, week: WeekId, day: Day) -> Result<&ProjectCalendarHours, CalendarError> {
        let mut current = week;
        let owner = loop {
            let candidate = self.week(current)?;
            if candidate.calendar_hours(day).is_some() {
                break current;
            }
            match candidate.parent() {
                Some(parent) => current = parent,
                None => {
                    debug!(week = %current, %day, "adding default hours to base week");
                    self.week_mut(current)?.add_default_calendar_hours_for(day);
                    break current;
                }
            }
        };
        self.week(owner)?
            .calendar_hours(day)
            .ok_or(CalendarError::UnknownWeek(owner))
    }

    /// Read-only counterpart of [`Self::hours`]: missing base hours are
    /// synthesised rather than stored.
    pub fn resolved_hours(&self, week: WeekId, day: Day) -> Cow<'_, [TimeRange]> {
        let mut current = self.weeks.get(week.index());
        while let Some(candidate) = current {
            if let Some(hours) = candidate.calendar_hours(day) {
                return Cow::Borrowed(hours.ranges());
            }
            current = candidate.parent().and_then(|p| self.weeks.get(p.index()));
        }
        Cow::Owned(default_hours(day))
    }

    /// Day type for `day` with `Default` resolved through the parent chain.
    /// A base week without a usable flag treats weekends as non-working.
    pub fn day_type(&self, week: WeekId, day: Day) -> DayType {
        let mut current = self.weeks.get(week.index());
        while let Some(candidate) = current {
            match candidate.working_day(day) {
                Some(DayType::Working) => return DayType::Working,
                Some(DayType::NonWorking) => return DayType::NonWorking,
                Some(DayType::Default) | None => {
                    current = candidate.parent().and_then(|p| self.weeks.get(p.index()));
                }
            }
        }
        week::base_day_type(day)
    }

    pub fn is_working_day(&self, week: WeekId, day: Day) -> bool {
        self.day_type(week, day) == DayType::Working
    }

    /// Working periods that `week` defines for `day`, following `Default`
    /// flags up to the parent week.
    pub fn week_ranges(&self, week: WeekId, day: Day) -> Cow<'_, [TimeRange]> {
        let Some(candidate) = self.weeks.get(week.index()) else {
            return Cow::Borrowed(&[]);
        };
        match candidate.working_day(day) {
            Some(DayType::Working) => self.resolved_hours(week, day),
            Some(DayType::NonWorking) => Cow::Borrowed(&[]),
            Some(DayType::Default) | None => match candidate.parent() {
                Some(parent) => self.week_ranges(parent, day),
                None if day.is_weekend() => Cow::Borrowed(&[]),
                None => self.resolved_hours(week, day),
            },
        }
    }

    // Calendars

    /// Adds an empty calendar. Its main week has no flags or hours, so it
    /// behaves as the default Monday to Friday week until configured.
    pub fn add_calendar(&mut self, name: impl Into<String>) -> CalendarId {
        let name = name.into();
        let week = self.add_week(Some(name.clone()));
        let id = CalendarId(self.calendars.len());
        self.calendars.push(ProjectCalendar {
            id,
            name,
            week,
            work_weeks: Vec::new(),
            exceptions: Vec::new(),
            expanded: Vec::new(),
            parent: None,
            defaults: None,
        });
        id
    }

    /// Adds a calendar with explicit flags and default hours on every day:
    /// Monday to Friday working, weekends non-working.
    pub fn add_base_calendar(&mut self, name: impl Into<String>) -> CalendarId {
        let id = self.add_calendar(name);
        let week = self.calendars[id.0].week;
        let main = &mut self.weeks[week.index()];
        for day in Day::ALL {
            main.set_working(day, !day.is_weekend());
        }
        main.add_default_calendar_hours();
        info!(calendar = %self.calendars[id.0].name, "added base calendar");
        id
    }

    /// Adds a calendar deriving everything from `parent`.
    pub fn add_derived_calendar(
        &mut self,
        name: impl Into<String>,
        parent: CalendarId,
    ) -> Result<CalendarId, CalendarError> {
        self.calendar(parent)?;
        let id = self.add_calendar(name);
        self.set_calendar_parent(id, Some(parent))?;
        Ok(id)
    }

    pub fn calendar(&self, id: CalendarId) -> Result<&ProjectCalendar, CalendarError> {
        self.calendars
            .get(id.0)
            .ok_or(CalendarError::UnknownCalendar(id))
    }

    pub fn calendar_mut(&mut self, id: CalendarId) -> Result<&mut ProjectCalendar, CalendarError> {
        self.calendars
            .get_mut(id.0)
            .ok_or(CalendarError::UnknownCalendar(id))
    }

    pub fn calendars(&self) -> &[ProjectCalendar] {
        &self.calendars
    }

    pub fn calendar_by_name(&self, name: &str) -> Option<CalendarId> {
        self.calendars.iter().find(|c| c.name == name).map(|c| c.id)
    }

    /// Calendars whose parent is `id`.
    pub fn derived_calendars(&self, id: CalendarId) -> Vec<CalendarId> {
        self.calendars
            .iter()
            .filter(|c| c.parent == Some(id))
            .map(|c| c.id)
            .collect()
    }

    /// Sets the parent calendar. The main week follows, deriving from the
    /// parent's main week.
    pub fn set_calendar_parent(
        &mut self,
        calendar: CalendarId,
        parent: Option<CalendarId>,
    ) -> Result<(), CalendarError> {
        let week = self.calendar(calendar)?.week;
        let parent_week = match parent {
            Some(parent) => {
                let mut current = Some(parent);
                while let Some(id) = current {
                    if id == calendar {
                        return Err(CalendarError::CalendarCycle { calendar, parent });
                    }
                    current = self.calendar(id)?.parent;
                }
                Some(self.calendar(parent)?.week)
            }
            None => None,
        };
        self.set_week_parent(week, parent_week)?;
        self.calendar_mut(calendar)?.parent = parent;
        Ok(())
    }

    /// Adds a dated work week to `calendar`. The new week derives from the
    /// calendar's main week, so every day starts as `Default`.
    pub fn add_work_week(
        &mut self,
        calendar: CalendarId,
        name: Option<String>,
        range: DateRange,
    ) -> Result<WeekId, CalendarError> {
        let main = self.calendar(calendar)?.week;
        let id = self.add_week(name);
        self.set_week_parent(id, Some(main))?;
        self.week_mut(id)?.set_date_range(Some(range));

        let starts: Vec<_> = self.weeks.iter().map(|w| w.date_range().map(DateRange::start)).collect();
        let cal = self.calendar_mut(calendar)?;
        cal.work_weeks.push(id);
        cal.work_weeks.sort_by_key(|w| starts[w.index()]);
        Ok(id)
    }

    pub fn add_exception(
        &mut self,
        calendar: CalendarId,
        exception: ProjectCalendarException,
    ) -> Result<(), CalendarError> {
        self.calendar_mut(calendar)?.add_exception(exception);
        Ok(())
    }

    /// Read-only view for working-time queries.
    pub fn view(&self, id: CalendarId) -> Result<CalendarRef<'_>, CalendarError> {
        self.calendar(id)?;
        Ok(CalendarRef::new(self, id))
    }
}
