use crate::day::Day;
use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Upper bound on generated dates, guarding against patterns that never
/// reach their end condition.
pub const MAX_OCCURRENCES: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceType {
    /// Code used by the MPX file format.
    pub fn mpx_code(self) -> i32 {
        match self {
            RecurrenceType::Daily => 1,
            RecurrenceType::Weekly => 4,
            RecurrenceType::Monthly => 8,
            RecurrenceType::Yearly => 16,
        }
    }

    /// Unknown codes fall back to daily.
    pub fn from_mpx_code(code: i32) -> RecurrenceType {
        match code {
            1 => RecurrenceType::Daily,
            4 => RecurrenceType::Weekly,
            8 => RecurrenceType::Monthly,
            16 => RecurrenceType::Yearly,
            other => {
                debug!(code = other, "recurrence code out of range, using daily");
                RecurrenceType::Daily
            }
        }
    }
}

/// MPX numbers days Monday (1) to Sunday (7).
pub fn day_from_mpx_code(code: i32) -> Day {
    match code {
        7 => Day::Sunday,
        1..=6 => Day::from_value(code + 1),
        other => {
            debug!(code = other, "mpx day code out of range, using Sunday");
            Day::Sunday
        }
    }
}

pub fn day_to_mpx_code(day: Day) -> i32 {
    match day {
        Day::Sunday => 7,
        other => i32::from(other.value()) - 1,
    }
}

/// Which occurrence of a weekday within a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeOrdinal {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl RelativeOrdinal {
    /// 1 to 4 select the nth occurrence; anything above 4 means the last.
    pub fn from_value(value: i32) -> RelativeOrdinal {
        match value {
            i32::MIN..=1 => RelativeOrdinal::First,
            2 => RelativeOrdinal::Second,
            3 => RelativeOrdinal::Third,
            4 => RelativeOrdinal::Fourth,
            _ => RelativeOrdinal::Last,
        }
    }

    pub fn value(self) -> i32 {
        match self {
            RelativeOrdinal::First => 1,
            RelativeOrdinal::Second => 2,
            RelativeOrdinal::Third => 3,
            RelativeOrdinal::Fourth => 4,
            RelativeOrdinal::Last => 5,
        }
    }
}

/// A set of weekdays, stored as one bit per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Day>", into = "Vec<Day>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn contains(&self, day: Day) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn insert(&mut self, day: Day) {
        self.0 |= 1 << day.index();
    }

    pub fn remove(&mut self, day: Day) {
        self.0 &= !(1 << day.index());
    }

    pub fn set(&mut self, day: Day, present: bool) {
        if present {
            self.insert(day);
        } else {
            self.remove(day);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in the set, Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = Day> + '_ {
        Day::ALL.into_iter().filter(|day| self.contains(*day))
    }

    /// Reads a file-format bitmap. `masks` holds the bit for each day,
    /// indexed Sunday to Saturday.
    pub fn from_bitmap(bitmap: u32, masks: &[u32; 7]) -> Self {
        let mut set = Self::new();
        for (day, mask) in Day::ALL.into_iter().zip(masks) {
            set.set(day, bitmap & mask != 0);
        }
        set
    }

    pub fn to_bitmap(&self, masks: &[u32; 7]) -> u32 {
        Day::ALL
            .into_iter()
            .zip(masks)
            .filter(|(day, _)| self.contains(*day))
            .fold(0, |acc, (_, mask)| acc | mask)
    }
}

impl FromIterator<Day> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Day>>(iter: I) -> Self {
        let mut set = Self::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl From<Vec<Day>> for WeekdaySet {
    fn from(days: Vec<Day>) -> Self {
        days.into_iter().collect()
    }
}

impl From<WeekdaySet> for Vec<Day> {
    fn from(set: WeekdaySet) -> Self {
        set.iter().collect()
    }
}

/// The shape of a recurrence. Each variant carries only the fields that
/// apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrencePattern {
    Daily {
        #[serde(default)]
        working_days_only: bool,
    },
    Weekly {
        days: WeekdaySet,
    },
    MonthlyAbsolute {
        day_number: u32,
    },
    MonthlyRelative {
        ordinal: RelativeOrdinal,
        day: Day,
    },
    YearlyAbsolute {
        month: u32,
        day_number: u32,
    },
    YearlyRelative {
        ordinal: RelativeOrdinal,
        day: Day,
        month: u32,
    },
}

impl RecurrencePattern {
    pub fn recurrence_type(&self) -> RecurrenceType {
        match self {
            RecurrencePattern::Daily { .. } => RecurrenceType::Daily,
            RecurrencePattern::Weekly { .. } => RecurrenceType::Weekly,
            RecurrencePattern::MonthlyAbsolute { .. } | RecurrencePattern::MonthlyRelative { .. } => {
                RecurrenceType::Monthly
            }
            RecurrencePattern::YearlyAbsolute { .. } | RecurrencePattern::YearlyRelative { .. } => {
                RecurrenceType::Yearly
            }
        }
    }

    pub fn is_relative(&self) -> bool {
        matches!(
            self,
            RecurrencePattern::MonthlyRelative { .. } | RecurrencePattern::YearlyRelative { .. }
        )
    }
}

/// A recurring pattern of dates, bounded either by a finish date or by a
/// number of occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringData {
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<u32>,
    #[serde(default)]
    pub use_end_date: bool,
    #[serde(default = "default_frequency")]
    pub frequency: u32,
    pub pattern: RecurrencePattern,
}

fn default_frequency() -> u32 {
    1
}

impl RecurringData {
    pub fn new(start_date: NaiveDate, pattern: RecurrencePattern) -> Self {
        Self {
            start_date,
            finish_date: None,
            occurrences: None,
            use_end_date: false,
            frequency: 1,
            pattern,
        }
    }

    /// Bounds the pattern by a finish date.
    pub fn until(mut self, finish_date: NaiveDate) -> Self {
        self.finish_date = Some(finish_date);
        self.use_end_date = true;
        self
    }

    /// Bounds the pattern by an occurrence count.
    pub fn times(mut self, occurrences: u32) -> Self {
        self.occurrences = Some(occurrences);
        self.use_end_date = false;
        self
    }

    pub fn every(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn recurrence_type(&self) -> RecurrenceType {
        self.pattern.recurrence_type()
    }

    pub fn is_relative(&self) -> bool {
        self.pattern.is_relative()
    }

    fn finish_bound(&self) -> Option<NaiveDate> {
        if self.use_end_date { self.finish_date } else { None }
    }

    fn frequency(&self) -> u32 {
        self.frequency.max(1)
    }

    fn more_dates(&self, date: NaiveDate, dates: &[NaiveDate]) -> bool {
        if dates.len() >= MAX_OCCURRENCES {
            return false;
        }
        match self.finish_bound() {
            Some(finish) => date <= finish,
            None => dates.len() < self.occurrences.unwrap_or(1).max(1) as usize,
        }
    }

    /// Expands the pattern into concrete dates, in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        match self.pattern {
            RecurrencePattern::Daily { .. } => self.daily_dates(&mut dates),
            RecurrencePattern::Weekly { days } => self.weekly_dates(days, &mut dates),
            RecurrencePattern::MonthlyAbsolute { day_number } => {
                self.monthly_absolute_dates(day_number, &mut dates)
            }
            RecurrencePattern::MonthlyRelative { ordinal, day } => {
                self.monthly_relative_dates(ordinal, day, &mut dates)
            }
            RecurrencePattern::YearlyAbsolute { month, day_number } => {
                self.yearly_absolute_dates(month, day_number, &mut dates)
            }
            RecurrencePattern::YearlyRelative { ordinal, day, month } => {
                self.yearly_relative_dates(ordinal, day, month, &mut dates)
            }
        }
        debug!(
            kind = ?self.recurrence_type(),
            count = dates.len(),
            "expanded recurring dates"
        );
        dates
    }

    fn daily_dates(&self, dates: &mut Vec<NaiveDate>) {
        let step = Days::new(u64::from(self.frequency()));
        let mut date = Some(self.start_date);
        while let Some(current) = date {
            if !self.more_dates(current, dates) {
                break;
            }
            dates.push(current);
            date = current.checked_add_days(step);
        }
    }

    fn weekly_dates(&self, days: WeekdaySet, dates: &mut Vec<NaiveDate>) {
        if days.is_empty() {
            return;
        }
        let gap = 7 * (u64::from(self.frequency()) - 1);
        let back = Days::new(u64::from(self.start_date.weekday().num_days_from_sunday()));
        let Some(mut week_start) = self.start_date.checked_sub_days(back) else {
            return;
        };

        while self.more_dates(week_start, dates) {
            for (offset, day) in Day::ALL.into_iter().enumerate() {
                if !days.contains(day) {
                    continue;
                }
                let Some(date) = week_start.checked_add_days(Days::new(offset as u64)) else {
                    return;
                };
                if !self.more_dates(date, dates) {
                    return;
                }
                if date >= self.start_date {
                    dates.push(date);
                }
            }
            match week_start.checked_add_days(Days::new(7 + gap)) {
                Some(next) => week_start = next,
                None => return,
            }
        }
    }

    fn monthly_absolute_dates(&self, day_number: u32, dates: &mut Vec<NaiveDate>) {
        let step = Months::new(self.frequency());
        let mut month = first_of_month(self.start_date);
        if day_number < self.start_date.day() {
            month = month.and_then(|m| m.checked_add_months(Months::new(1)));
        }
        while let Some(first) = month {
            let Some(date) = clamped_day(first, day_number) else {
                return;
            };
            if !self.more_dates(date, dates) {
                return;
            }
            dates.push(date);
            month = first.checked_add_months(step);
        }
    }

    fn monthly_relative_dates(&self, ordinal: RelativeOrdinal, day: Day, dates: &mut Vec<NaiveDate>) {
        let step = Months::new(self.frequency());
        let mut month = first_of_month(self.start_date);
        while let Some(first) = month {
            let Some(date) = relative_day(first, ordinal, day) else {
                return;
            };
            if date >= self.start_date {
                if !self.more_dates(date, dates) {
                    return;
                }
                dates.push(date);
            }
            month = first.checked_add_months(step);
        }
    }

    fn yearly_absolute_dates(&self, month: u32, day_number: u32, dates: &mut Vec<NaiveDate>) {
        let year = Months::new(12);
        let mut first = NaiveDate::from_ymd_opt(self.start_date.year(), month.clamp(1, 12), 1);
        if let Some(current) = first {
            if clamped_day(current, day_number).is_some_and(|date| date < self.start_date) {
                first = current.checked_add_months(year);
            }
        }
        while let Some(current) = first {
            let Some(date) = clamped_day(current, day_number) else {
                return;
            };
            if !self.more_dates(date, dates) {
                return;
            }
            dates.push(date);
            first = current.checked_add_months(year);
        }
    }

    fn yearly_relative_dates(
        &self,
        ordinal: RelativeOrdinal,
        day: Day,
        month: u32,
        dates: &mut Vec<NaiveDate>,
    ) {
        let year = Months::new(12);
        let mut first = NaiveDate::from_ymd_opt(self.start_date.year(), month.clamp(1, 12), 1);
        while let Some(current) = first {
            let Some(date) = relative_day(current, ordinal, day) else {
                return;
            };
            if date >= self.start_date {
                if !self.more_dates(date, dates) {
                    return;
                }
                dates.push(date);
            }
            first = current.checked_add_months(year);
        }
    }
}

impl fmt::Display for RecurringData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} every {} from {}",
            self.recurrence_type(),
            self.frequency(),
            self.start_date
        )?;
        match (self.finish_bound(), self.occurrences) {
            (Some(finish), _) => write!(f, " until {finish}"),
            (None, Some(count)) => write!(f, " for {count} occurrences"),
            (None, None) => Ok(()),
        }
    }
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)
}

fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(28, |last| last.day())
}

/// `day_number` within the month of `first`, clamped to the month length.
fn clamped_day(first: NaiveDate, day_number: u32) -> Option<NaiveDate> {
    first.with_day(day_number.clamp(1, days_in_month(first)))
}

fn relative_day(first: NaiveDate, ordinal: RelativeOrdinal, day: Day) -> Option<NaiveDate> {
    let wanted = i64::from(day.value()) - 1;
    match ordinal {
        RelativeOrdinal::Last => {
            let last = first.with_day(days_in_month(first))?;
            let current = i64::from(last.weekday().num_days_from_sunday());
            let back = (current - wanted).rem_euclid(7);
            last.checked_sub_days(Days::new(back as u64))
        }
        other => {
            let current = i64::from(first.weekday().num_days_from_sunday());
            let forward = (wanted - current).rem_euclid(7) + 7 * (i64::from(other.value()) - 1);
            first.checked_add_days(Days::new(forward as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn relative_day_finds_nth_and_last_weekday() {
        let june = d(2024, 6, 1);
        assert_eq!(
            relative_day(june, RelativeOrdinal::First, Day::Monday),
            Some(d(2024, 6, 3))
        );
        assert_eq!(
            relative_day(june, RelativeOrdinal::Third, Day::Saturday),
            Some(d(2024, 6, 15))
        );
        assert_eq!(
            relative_day(june, RelativeOrdinal::Last, Day::Friday),
            Some(d(2024, 6, 28))
        );
    }

    #[test]
    fn month_length_accounts_for_leap_years() {
        assert_eq!(days_in_month(d(2024, 2, 1)), 29);
        assert_eq!(days_in_month(d(2023, 2, 1)), 28);
        assert_eq!(days_in_month(d(2024, 12, 1)), 31);
    }

    #[test]
    fn mpx_day_codes_start_on_monday() {
        assert_eq!(day_from_mpx_code(1), Day::Monday);
        assert_eq!(day_from_mpx_code(7), Day::Sunday);
        for day in Day::ALL {
            assert_eq!(day_from_mpx_code(day_to_mpx_code(day)), day);
        }
    }
}
