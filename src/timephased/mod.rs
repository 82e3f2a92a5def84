mod normaliser;

pub use normaliser::{
    MERGE_TOLERANCE, MppNormaliser, MspdiNormaliser, TimephasedFormat, TimephasedNormaliser,
    convert_to_hours, merge_same_work,
};

use crate::calendar::{CalendarId, ProjectCalendars};
use crate::duration::Duration;
use crate::error::CalendarError;
use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// A span of assigned work between two instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimephasedResourceAssignment {
    pub start: NaiveDateTime,
    pub finish: NaiveDateTime,
    pub total_work: Duration,
    /// Work per working day. Unset on raw data read from a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_per_day: Option<Duration>,
    #[serde(default)]
    pub modified: bool,
}

impl TimephasedResourceAssignment {
    pub fn new(start: NaiveDateTime, finish: NaiveDateTime, total_work: Duration) -> Self {
        Self {
            start,
            finish,
            total_work,
            work_per_day: None,
            modified: false,
        }
    }

    pub fn with_work_per_day(mut self, work_per_day: Duration) -> Self {
        self.work_per_day = Some(work_per_day);
        self
    }

    /// Daily rate used when comparing neighbouring spans: the per-day work
    /// when known, the total otherwise.
    pub fn daily_rate(&self) -> Duration {
        self.work_per_day.unwrap_or(self.total_work)
    }

    /// True when the span starts and finishes on the same calendar day. A
    /// finish at 00:00 belongs to the previous day.
    pub fn is_single_day(&self) -> bool {
        let mut finish_day = self.finish.date();
        if self.finish.time() == NaiveTime::MIN && self.finish > self.start {
            finish_day = (self.finish - TimeDelta::days(1)).date();
        }
        finish_day <= self.start.date()
    }

    fn scaled(&self, total_factor: f64, per_day_factor: f64) -> Self {
        Self {
            total_work: self.total_work.scale(total_factor),
            work_per_day: self.work_per_day.map(|work| work.scale(per_day_factor)),
            ..self.clone()
        }
    }
}

/// Timephased work for one assignment, normalised on first access.
///
/// Raw data is held as read. The first call to [`TimephasedData::data`]
/// runs the normaliser for the data's format against its calendar, after
/// which the normalised list is returned as is.
#[derive(Debug, Clone, PartialEq)]
pub struct TimephasedData {
    calendar: CalendarId,
    format: TimephasedFormat,
    data: Vec<TimephasedResourceAssignment>,
    raw: bool,
}

impl TimephasedData {
    pub fn new(
        calendar: CalendarId,
        format: TimephasedFormat,
        data: Vec<TimephasedResourceAssignment>,
        raw: bool,
    ) -> Self {
        Self {
            calendar,
            format,
            data,
            raw,
        }
    }

    pub fn calendar(&self) -> CalendarId {
        self.calendar
    }

    pub fn format(&self) -> TimephasedFormat {
        self.format
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn data(
        &mut self,
        calendars: &ProjectCalendars,
    ) -> Result<&[TimephasedResourceAssignment], CalendarError> {
        if self.raw {
            let calendar = calendars.view(self.calendar)?;
            let raw = std::mem::take(&mut self.data);
            self.data = self.format.normaliser().normalise(&calendar, raw);
            self.raw = false;
        }
        Ok(&self.data)
    }

    /// Copy with every total multiplied by `total_factor` and every per-day
    /// amount by `per_day_factor`. The copy keeps this one's raw flag.
    pub fn scaled(&self, total_factor: f64, per_day_factor: f64) -> Self {
        Self {
            calendar: self.calendar,
            format: self.format,
            data: self
                .data
                .iter()
                .map(|assignment| assignment.scaled(total_factor, per_day_factor))
                .collect(),
            raw: self.raw,
        }
    }
}
