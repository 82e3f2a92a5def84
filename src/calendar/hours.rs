use super::WeekId;
use crate::date_range::TimeRange;
use crate::day::Day;

/// The working periods that apply on one day of one week definition.
///
/// Hours remember the week that created them; a week only accepts hours it
/// owns, and always stores them in the slot for their own day.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectCalendarHours {
    day: Day,
    parent: WeekId,
    ranges: Vec<TimeRange>,
}

impl ProjectCalendarHours {
    pub(crate) fn new(parent: WeekId, day: Day) -> Self {
        Self {
            day,
            parent,
            ranges: Vec::new(),
        }
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn parent_week(&self) -> WeekId {
        self.parent
    }

    pub fn add_range(&mut self, range: TimeRange) {
        self.ranges.push(range);
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.add_range(range);
        self
    }

    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    pub fn range(&self, index: usize) -> Option<&TimeRange> {
        self.ranges.get(index)
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Total working time across all ranges, in milliseconds.
    pub fn total_millis(&self) -> i64 {
        self.ranges.iter().map(TimeRange::duration_millis).sum()
    }
}
