use crate::calendar::{CalendarId, ProjectCalendarException, ProjectCalendars, WeekId};
use crate::date_range::{DateRange, TimeRange};
use crate::day::{Day, DayType};
use crate::duration::TimeUnitDefaults;
use crate::error::CalendarError;
use crate::recurring::RecurringData;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Serializable description of every calendar in a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub defaults: TimeUnitDefaults,
    #[serde(default)]
    pub calendars: Vec<CalendarConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<TimeUnitDefaults>,
    #[serde(default)]
    pub days: Vec<DayConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub work_weeks: Vec<WorkWeekConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<ExceptionConfig>,
}

impl CalendarConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            defaults: None,
            days: Vec::new(),
            work_weeks: Vec::new(),
            exceptions: Vec::new(),
        }
    }
}

/// One day of a week definition. Days left out keep no flag and no hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayConfig {
    pub day: Day,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_type: Option<DayType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Vec<TimeRange>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkWeekConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub days: Vec<DayConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub hours: Vec<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<RecurringData>,
}

impl ExceptionConfig {
    fn to_exception(&self) -> Result<ProjectCalendarException, CalendarError> {
        let mut exception = match &self.recurring {
            Some(recurring) => ProjectCalendarException::recurring(recurring.clone()),
            None => ProjectCalendarException::from_dates(self.from, self.to),
        };
        if let Some(name) = &self.name {
            exception = exception.with_name(name.clone());
        }
        for range in &self.hours {
            exception.add_range(*range)?;
        }
        Ok(exception)
    }

    fn from_exception(exception: &ProjectCalendarException) -> Self {
        Self {
            name: exception.name().map(str::to_string),
            from: exception.from_date().date(),
            to: exception.to_date().date(),
            hours: exception.ranges().to_vec(),
            recurring: exception.recurrence().cloned(),
        }
    }
}

impl ProjectCalendars {
    /// Builds calendars from configuration. Parents are resolved by name
    /// once every calendar exists, so order in the file does not matter.
    pub fn from_config(config: &ProjectConfig) -> Result<Self, CalendarError> {
        let mut store = ProjectCalendars::with_defaults(config.defaults);
        let ids: Vec<CalendarId> = config
            .calendars
            .iter()
            .map(|calendar| store.add_calendar(calendar.name.clone()))
            .collect();

        for (calendar, id) in config.calendars.iter().zip(&ids) {
            if let Some(parent) = &calendar.parent {
                let parent_id = store
                    .calendar_by_name(parent)
                    .ok_or_else(|| CalendarError::UnknownCalendarName(parent.clone()))?;
                store.set_calendar_parent(*id, Some(parent_id))?;
            }
        }

        for (calendar, id) in config.calendars.iter().zip(ids) {
            store.calendar_mut(id)?.set_defaults(calendar.defaults);
            let main = store.calendar(id)?.week();
            store.apply_days(main, &calendar.days)?;

            for work_week in &calendar.work_weeks {
                let range = DateRange::from_days(work_week.from, work_week.to);
                let week = store.add_work_week(id, work_week.name.clone(), range)?;
                store.apply_days(week, &work_week.days)?;
            }

            for exception in &calendar.exceptions {
                store.add_exception(id, exception.to_exception()?)?;
            }
        }

        tracing::info!(calendars = store.calendars().len(), "built calendars from config");
        Ok(store)
    }

    pub fn to_config(&self) -> ProjectConfig {
        let calendars = self
            .calendars()
            .iter()
            .map(|calendar| {
                let parent = calendar
                    .parent()
                    .and_then(|parent| self.calendar(parent).ok())
                    .map(|parent| parent.name().to_string());
                let work_weeks = calendar
                    .work_weeks()
                    .iter()
                    .filter_map(|id| self.week(*id).ok())
                    .filter_map(|week| {
                        let range = week.date_range()?;
                        Some(WorkWeekConfig {
                            name: week.name().map(str::to_string),
                            from: range.start().date(),
                            to: range.end().date(),
                            days: self.day_configs(week.id()),
                        })
                    })
                    .collect();
                CalendarConfig {
                    name: calendar.name().to_string(),
                    parent,
                    defaults: calendar.defaults().copied(),
                    days: self.day_configs(calendar.week()),
                    work_weeks,
                    exceptions: calendar
                        .exceptions()
                        .iter()
                        .map(ExceptionConfig::from_exception)
                        .collect(),
                }
            })
            .collect();

        ProjectConfig {
            defaults: *self.defaults(),
            calendars,
        }
    }

    fn apply_days(&mut self, week: WeekId, days: &[DayConfig]) -> Result<(), CalendarError> {
        let target = self.week_mut(week)?;
        for config in days {
            if let Some(day_type) = config.day_type {
                target.set_working_day(config.day, Some(day_type));
            }
            if let Some(ranges) = &config.hours {
                let hours = target.add_calendar_hours(config.day);
                for range in ranges {
                    hours.add_range(*range);
                }
            }
        }
        Ok(())
    }

    fn day_configs(&self, week: WeekId) -> Vec<DayConfig> {
        let Ok(week) = self.week(week) else {
            return Vec::new();
        };
        Day::ALL
            .into_iter()
            .filter_map(|day| {
                let day_type = week.working_day(day);
                let hours = week.calendar_hours(day).map(|hours| hours.ranges().to_vec());
                if day_type.is_none() && hours.is_none() {
                    return None;
                }
                Some(DayConfig {
                    day,
                    day_type,
                    hours,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_parent_name_is_reported() {
        let mut child = CalendarConfig::new("Night");
        child.parent = Some("Missing".into());
        let config = ProjectConfig {
            defaults: TimeUnitDefaults::default(),
            calendars: vec![child],
        };
        assert_eq!(
            ProjectCalendars::from_config(&config).unwrap_err(),
            CalendarError::UnknownCalendarName("Missing".into())
        );
    }

    #[test]
    fn parent_may_be_listed_after_child() {
        let mut child = CalendarConfig::new("Night");
        child.parent = Some("Standard".into());
        let config = ProjectConfig {
            defaults: TimeUnitDefaults::default(),
            calendars: vec![child, CalendarConfig::new("Standard")],
        };
        let store = ProjectCalendars::from_config(&config).unwrap();
        let night = store.calendar_by_name("Night").unwrap();
        let standard = store.calendar_by_name("Standard").unwrap();
        assert_eq!(store.calendar(night).unwrap().parent(), Some(standard));
    }
}
