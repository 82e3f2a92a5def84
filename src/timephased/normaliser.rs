use super::TimephasedResourceAssignment;
use crate::calendar::CalendarRef;
use crate::duration::{Duration, TimeUnit, TimeUnitDefaults};
use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Neighbouring spans whose daily rates differ by no more than this are
/// merged.
pub const MERGE_TOLERANCE: f64 = 0.01;

const MINUTES_PER_STANDARD_DAY: f64 = 480.0;
const PER_DAY_EQUALITY_DELTA: f64 = 0.1;

/// Turns raw timephased work read from a file into the canonical form:
/// single-day spans merged into runs of equal daily work, with amounts in
/// hours.
pub trait TimephasedNormaliser {
    fn normalise(
        &self,
        calendar: &CalendarRef<'_>,
        list: Vec<TimephasedResourceAssignment>,
    ) -> Vec<TimephasedResourceAssignment>;
}

/// Normaliser for XML project data, where raw spans carry only a total.
/// Multi-day spans are split pro rata to calendar working time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MspdiNormaliser;

/// Normaliser for binary project data, where raw spans carry a per-day
/// rate used when splitting.
#[derive(Debug, Clone, Copy, Default)]
pub struct MppNormaliser;

static MSPDI: MspdiNormaliser = MspdiNormaliser;
static MPP: MppNormaliser = MppNormaliser;

/// Source format of timephased data, selecting its normaliser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimephasedFormat {
    #[default]
    Mspdi,
    Mpp,
}

impl TimephasedFormat {
    pub fn normaliser(self) -> &'static dyn TimephasedNormaliser {
        match self {
            TimephasedFormat::Mspdi => &MSPDI,
            TimephasedFormat::Mpp => &MPP,
        }
    }
}

impl fmt::Display for TimephasedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimephasedFormat::Mspdi => f.write_str("mspdi"),
            TimephasedFormat::Mpp => f.write_str("mpp"),
        }
    }
}

impl FromStr for TimephasedFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mspdi" | "xml" => Ok(TimephasedFormat::Mspdi),
            "mpp" => Ok(TimephasedFormat::Mpp),
            other => Err(format!("unknown timephased format '{other}'")),
        }
    }
}

impl TimephasedNormaliser for MspdiNormaliser {
    fn normalise(
        &self,
        calendar: &CalendarRef<'_>,
        list: Vec<TimephasedResourceAssignment>,
    ) -> Vec<TimephasedResourceAssignment> {
        if list.is_empty() {
            return list;
        }
        let input = list.len();
        let list = split_days(calendar, list, SplitMode::ProRata);
        let list = merge_same_day(calendar, list);
        let list = merge_same_work(list);
        let list = clamp_to_working_times(calendar, list);
        let list = convert_to_hours(list);
        debug!(format = "mspdi", input, output = list.len(), "normalised timephased work");
        list
    }
}

impl TimephasedNormaliser for MppNormaliser {
    fn normalise(
        &self,
        calendar: &CalendarRef<'_>,
        list: Vec<TimephasedResourceAssignment>,
    ) -> Vec<TimephasedResourceAssignment> {
        if list.is_empty() {
            return list;
        }
        let input = list.len();
        let list = split_days(calendar, list, SplitMode::PerDayRate);
        let list = merge_same_day(calendar, list);
        let list = merge_same_work(list);
        let list = convert_to_hours(list);
        debug!(format = "mpp", input, output = list.len(), "normalised timephased work");
        list
    }
}

/// Collapses neighbouring spans with the same daily rate into one span.
///
/// Every span in the result carries a per-day amount. A merged span runs
/// from the first span's start to the last span's finish, sums their
/// totals and keeps the first span's rate.
pub fn merge_same_work(list: Vec<TimephasedResourceAssignment>) -> Vec<TimephasedResourceAssignment> {
    let defaults = TimeUnitDefaults::default();
    let mut result: Vec<TimephasedResourceAssignment> = Vec::with_capacity(list.len());
    for mut assignment in list {
        let rate = assignment.daily_rate();
        if let Some(previous) = result.last_mut() {
            if (previous.daily_rate().amount() - rate.amount()).abs() <= MERGE_TOLERANCE {
                previous.finish = assignment.finish;
                previous.total_work = previous.total_work.add(&assignment.total_work, &defaults);
                previous.modified |= assignment.modified;
                continue;
            }
        }
        assignment.work_per_day = Some(rate);
        result.push(assignment);
    }
    result
}

/// Re-expresses every amount in hours.
pub fn convert_to_hours(list: Vec<TimephasedResourceAssignment>) -> Vec<TimephasedResourceAssignment> {
    let defaults = TimeUnitDefaults::default();
    list.into_iter()
        .map(|mut assignment| {
            assignment.total_work = assignment.total_work.convert_units(TimeUnit::Hours, &defaults);
            assignment.work_per_day = assignment
                .work_per_day
                .map(|work| work.convert_units(TimeUnit::Hours, &defaults));
            assignment
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitMode {
    /// First day's share is proportional to its calendar working time.
    ProRata,
    /// First day's share comes from the span's per-day rate.
    PerDayRate,
}

fn split_days(
    calendar: &CalendarRef<'_>,
    list: Vec<TimephasedResourceAssignment>,
    mode: SplitMode,
) -> Vec<TimephasedResourceAssignment> {
    let mut result = Vec::with_capacity(list.len());
    for assignment in list {
        let mut pending = Some(assignment);
        while let Some(current) = pending.take() {
            if current.is_single_day() {
                result.push(current);
                break;
            }
            let (first, rest) = split_first_day(calendar, &current, mode);
            result.extend(first);
            match rest {
                Some(rest) if rest.start <= current.start => result.push(rest),
                other => pending = other,
            }
        }
    }
    result
}

fn split_first_day(
    calendar: &CalendarRef<'_>,
    assignment: &TimephasedResourceAssignment,
    mode: SplitMode,
) -> (Option<TimephasedResourceAssignment>, Option<TimephasedResourceAssignment>) {
    let defaults = calendar.defaults();
    let calendar_work = calendar
        .work(assignment.start, assignment.finish, TimeUnit::Minutes)
        .amount();
    if calendar_work <= 0.0 {
        debug!(start = %assignment.start, finish = %assignment.finish, "no calendar work in span, left unsplit");
        return (Some(assignment.clone()), None);
    }

    let total = assignment.total_work.convert_units(TimeUnit::Minutes, &defaults).amount();
    let start_date = assignment.start.date();

    let (first, split_finish, first_minutes) = if calendar.is_working_date(start_date) {
        let split_finish = calendar
            .finish_instant(start_date)
            .map_or(assignment.start, |finish| finish.max(assignment.start))
            .min(assignment.finish);
        let split_work = calendar
            .work(assignment.start, split_finish, TimeUnit::Minutes)
            .amount();
        let minutes = match mode {
            SplitMode::ProRata => truncate_hundredths(total * split_work / calendar_work),
            SplitMode::PerDayRate => {
                let per_day = assignment
                    .daily_rate()
                    .convert_units(TimeUnit::Minutes, &defaults)
                    .amount();
                let day_work = calendar.work_on_date(start_date, TimeUnit::Minutes).amount();
                if (split_work - day_work).abs() < PER_DAY_EQUALITY_DELTA
                    && (split_work - per_day).abs() < PER_DAY_EQUALITY_DELTA
                {
                    per_day
                } else {
                    per_day * split_work / MINUTES_PER_STANDARD_DAY
                }
            }
        }
        .min(total);

        let first = TimephasedResourceAssignment {
            finish: split_finish,
            total_work: Duration::new(minutes, TimeUnit::Minutes),
            ..assignment.clone()
        };
        (Some(first), split_finish, minutes)
    } else {
        (None, assignment.start, 0.0)
    };

    let split_start = calendar.next_work_start(split_finish);
    let rest = (split_start < assignment.finish).then(|| TimephasedResourceAssignment {
        start: split_start,
        total_work: Duration::new(total - first_minutes, TimeUnit::Minutes),
        ..assignment.clone()
    });
    (first, rest)
}

fn truncate_hundredths(value: f64) -> f64 {
    (value * 100.0).trunc() / 100.0
}

/// Sums spans sharing a start date and drops empty spans that fall on
/// non-working time. Each remaining span's per-day amount is its total.
fn merge_same_day(
    calendar: &CalendarRef<'_>,
    list: Vec<TimephasedResourceAssignment>,
) -> Vec<TimephasedResourceAssignment> {
    let defaults = calendar.defaults();
    let mut result: Vec<TimephasedResourceAssignment> = Vec::with_capacity(list.len());
    for mut assignment in list {
        let same_day = result
            .last()
            .is_some_and(|previous| previous.start.date() == assignment.start.date());
        if same_day {
            if let Some(previous) = result.pop() {
                let previous_has_work = !previous.total_work.is_zero();
                let has_work = !assignment.total_work.is_zero();
                if previous_has_work && !has_work {
                    result.push(previous);
                    continue;
                }
                if previous_has_work && has_work {
                    assignment = TimephasedResourceAssignment {
                        start: previous.start,
                        total_work: previous.total_work.add(&assignment.total_work, &defaults),
                        modified: previous.modified || assignment.modified,
                        ..assignment
                    };
                } else if !has_work {
                    assignment = previous;
                }
            }
        }

        assignment.work_per_day = Some(assignment.total_work);
        let calendar_work = calendar.work(assignment.start, assignment.finish, TimeUnit::Minutes);
        if calendar_work.is_zero() && assignment.total_work.is_zero() {
            continue;
        }
        result.push(assignment);
    }
    result
}

/// Pulls span bounds inside the working day. Empty spans snap to the
/// day's start and finish.
fn clamp_to_working_times(
    calendar: &CalendarRef<'_>,
    mut list: Vec<TimephasedResourceAssignment>,
) -> Vec<TimephasedResourceAssignment> {
    for assignment in &mut list {
        let empty = assignment.total_work.is_zero();
        if let Some(start) = calendar.start_instant(assignment.start.date()) {
            if (empty && assignment.start != start) || assignment.start < start {
                assignment.start = start;
            }
        }
        if let Some(finish) = calendar.finish_instant(finish_day(assignment)) {
            if (empty && assignment.finish != finish) || assignment.finish > finish {
                assignment.finish = finish;
            }
        }
    }
    list
}

/// Day a span finishes on, counting a 00:00 finish as the previous day.
fn finish_day(assignment: &TimephasedResourceAssignment) -> NaiveDate {
    if assignment.finish.time() == NaiveTime::MIN && assignment.finish > assignment.start {
        (assignment.finish - TimeDelta::days(1)).date()
    } else {
        assignment.finish.date()
    }
}
