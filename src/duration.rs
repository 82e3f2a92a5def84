use crate::error::DurationParseError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const ELAPSED_HOURS_PER_DAY: f64 = 24.0;
const ELAPSED_HOURS_PER_WEEK: f64 = 24.0 * 7.0;
const WEEKS_PER_MONTH: f64 = 4.0;
const WEEKS_PER_YEAR: f64 = 52.0;

/// Units a [`Duration`] can be expressed in. Each unit has an elapsed
/// counterpart measuring wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minutes = 0,
    Hours = 1,
    Days = 2,
    Weeks = 3,
    Months = 4,
    Years = 5,
    Percent = 6,
    ElapsedMinutes = 7,
    ElapsedHours = 8,
    ElapsedDays = 9,
    ElapsedWeeks = 10,
    ElapsedMonths = 11,
    ElapsedYears = 12,
    ElapsedPercent = 13,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 14] = [
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
        TimeUnit::Weeks,
        TimeUnit::Months,
        TimeUnit::Years,
        TimeUnit::Percent,
        TimeUnit::ElapsedMinutes,
        TimeUnit::ElapsedHours,
        TimeUnit::ElapsedDays,
        TimeUnit::ElapsedWeeks,
        TimeUnit::ElapsedMonths,
        TimeUnit::ElapsedYears,
        TimeUnit::ElapsedPercent,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    /// Unknown codes fall back to days.
    pub fn from_value(value: i32) -> TimeUnit {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .unwrap_or_else(|| {
                tracing::debug!(value, "time unit code out of range, using days");
                TimeUnit::Days
            })
    }

    pub fn is_elapsed(self) -> bool {
        self.value() >= TimeUnit::ElapsedMinutes.value()
    }

    pub fn is_hours(self) -> bool {
        matches!(self, TimeUnit::Hours | TimeUnit::ElapsedHours)
    }

    /// Canonical suffix used when formatting.
    pub fn suffix(self) -> &'static str {
        UNIT_SUFFIXES[self.value() as usize][0]
    }

    /// Looks a textual suffix up in the unit table, ignoring case and
    /// surrounding whitespace.
    pub fn from_suffix(suffix: &str) -> Option<TimeUnit> {
        let wanted = suffix.trim().to_ascii_lowercase();
        UNIT_SUFFIXES
            .iter()
            .position(|names| names.contains(&wanted.as_str()))
            .map(|idx| Self::ALL[idx])
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

const UNIT_SUFFIXES: [&[&str]; 14] = [
    &["m", "min", "mins", "minutes"],
    &["h", "hr", "hrs", "hours"],
    &["d", "day", "days"],
    &["w", "wk", "wks", "weeks"],
    &["mo", "mon", "months"],
    &["y", "yr", "years"],
    &["%"],
    &["em", "emin"],
    &["eh", "ehr"],
    &["ed"],
    &["ew", "ewk"],
    &["emo", "emon"],
    &["ey", "eyr"],
    &["e%"],
];

/// Hours-per-day and hours-per-week used when converting between calendar
/// (non-elapsed) units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeUnitDefaults {
    pub hours_per_day: f64,
    pub hours_per_week: f64,
}

impl TimeUnitDefaults {
    pub fn new(hours_per_day: f64, hours_per_week: f64) -> Self {
        Self {
            hours_per_day,
            hours_per_week,
        }
    }

    pub fn minutes_per_day(&self) -> f64 {
        self.hours_per_day * 60.0
    }

    pub fn minutes_per_week(&self) -> f64 {
        self.hours_per_week * 60.0
    }
}

impl Default for TimeUnitDefaults {
    fn default() -> Self {
        Self::new(8.0, 40.0)
    }
}

/// Separators used to read the numeric part of a textual duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub decimal_separator: char,
    pub grouping_separator: Option<char>,
}

impl NumberFormat {
    pub fn new(decimal_separator: char, grouping_separator: Option<char>) -> Self {
        Self {
            decimal_separator,
            grouping_separator,
        }
    }

    fn parse(&self, text: &str) -> Option<f64> {
        let mut normalised = String::with_capacity(text.len());
        for ch in text.trim().chars() {
            if Some(ch) == self.grouping_separator {
                continue;
            }
            if ch == self.decimal_separator {
                normalised.push('.');
            } else {
                normalised.push(ch);
            }
        }
        normalised.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::new('.', Some(','))
    }
}

/// An amount of time in a given unit.
///
/// Zero amounts are canonicalised: [`Duration::new`] hands back a copy of
/// the shared zero for the unit, and [`Duration::zero`] exposes the shared
/// instance itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Duration {
    amount: f64,
    units: TimeUnit,
}

static ZERO_DURATIONS: [Duration; 14] = [
    Duration::raw(0.0, TimeUnit::Minutes),
    Duration::raw(0.0, TimeUnit::Hours),
    Duration::raw(0.0, TimeUnit::Days),
    Duration::raw(0.0, TimeUnit::Weeks),
    Duration::raw(0.0, TimeUnit::Months),
    Duration::raw(0.0, TimeUnit::Years),
    Duration::raw(0.0, TimeUnit::Percent),
    Duration::raw(0.0, TimeUnit::ElapsedMinutes),
    Duration::raw(0.0, TimeUnit::ElapsedHours),
    Duration::raw(0.0, TimeUnit::ElapsedDays),
    Duration::raw(0.0, TimeUnit::ElapsedWeeks),
    Duration::raw(0.0, TimeUnit::ElapsedMonths),
    Duration::raw(0.0, TimeUnit::ElapsedYears),
    Duration::raw(0.0, TimeUnit::ElapsedPercent),
];

const EQUALITY_TOLERANCE: f64 = 0.00001;

impl Duration {
    const fn raw(amount: f64, units: TimeUnit) -> Self {
        Self { amount, units }
    }

    pub fn new(amount: f64, units: TimeUnit) -> Duration {
        if amount == 0.0 {
            *Self::zero(units)
        } else {
            Self::raw(amount, units)
        }
    }

    /// The process-wide zero duration for `units`.
    pub fn zero(units: TimeUnit) -> &'static Duration {
        &ZERO_DURATIONS[units.value() as usize]
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn units(&self) -> TimeUnit {
        self.units
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0.0
    }

    pub fn convert_units(&self, to: TimeUnit, defaults: &TimeUnitDefaults) -> Duration {
        if to == self.units {
            return *self;
        }
        Self::convert(self.amount, self.units, to, defaults)
    }

    /// Approximate conversion between units.
    ///
    /// The amount is first expressed in hours, then expanded into `to`.
    /// Elapsed units use fixed 24h days, 7 day weeks, 4 week months and
    /// 52 week years; calendar units use `defaults`. Calendar exceptions and
    /// non-working days are ignored: use a calendar's working-time queries
    /// when exact figures are needed. Percent units convert with a ratio
    /// of one.
    pub fn convert(amount: f64, from: TimeUnit, to: TimeUnit, defaults: &TimeUnitDefaults) -> Duration {
        let hours_per_day = defaults.hours_per_day;
        let hours_per_week = defaults.hours_per_week;

        let mut hours = amount;
        match from {
            TimeUnit::Years => hours *= hours_per_week * WEEKS_PER_YEAR,
            TimeUnit::ElapsedYears => hours *= ELAPSED_HOURS_PER_WEEK * WEEKS_PER_YEAR,
            TimeUnit::Months => hours *= hours_per_week * WEEKS_PER_MONTH,
            TimeUnit::ElapsedMonths => hours *= ELAPSED_HOURS_PER_WEEK * WEEKS_PER_MONTH,
            TimeUnit::Weeks => hours *= hours_per_week,
            TimeUnit::ElapsedWeeks => hours *= ELAPSED_HOURS_PER_WEEK,
            TimeUnit::Days => hours *= hours_per_day,
            TimeUnit::ElapsedDays => hours *= ELAPSED_HOURS_PER_DAY,
            TimeUnit::Minutes | TimeUnit::ElapsedMinutes => hours /= 60.0,
            TimeUnit::Hours
            | TimeUnit::ElapsedHours
            | TimeUnit::Percent
            | TimeUnit::ElapsedPercent => {}
        }

        let result = if to.is_hours() {
            hours
        } else {
            match to {
                TimeUnit::Minutes | TimeUnit::ElapsedMinutes => hours * 60.0,
                TimeUnit::Days => divide(hours, hours_per_day),
                TimeUnit::ElapsedDays => hours / ELAPSED_HOURS_PER_DAY,
                TimeUnit::Weeks => divide(hours, hours_per_week),
                TimeUnit::ElapsedWeeks => hours / ELAPSED_HOURS_PER_WEEK,
                TimeUnit::Months => divide(hours, hours_per_week * WEEKS_PER_MONTH),
                TimeUnit::ElapsedMonths => hours / (ELAPSED_HOURS_PER_WEEK * WEEKS_PER_MONTH),
                TimeUnit::Years => divide(hours, hours_per_week * WEEKS_PER_YEAR),
                TimeUnit::ElapsedYears => hours / (ELAPSED_HOURS_PER_WEEK * WEEKS_PER_YEAR),
                _ => hours,
            }
        };

        Duration::new(result, to)
    }

    /// Parses text such as `5d`, `3.5hrs` or `12`. A missing or unknown
    /// unit suffix means days.
    pub fn parse(text: &str, format: &NumberFormat) -> Result<Duration, DurationParseError> {
        let trimmed = text.trim();
        let error = || DurationParseError {
            input: text.to_string(),
        };

        let split = trimmed
            .char_indices()
            .rev()
            .find(|(_, ch)| ch.is_ascii_digit())
            .map(|(idx, ch)| idx + ch.len_utf8())
            .ok_or_else(error)?;

        let (number, suffix) = trimmed.split_at(split);
        let amount = format.parse(number).ok_or_else(error)?;
        let units = if suffix.trim().is_empty() {
            TimeUnit::Days
        } else {
            TimeUnit::from_suffix(suffix).unwrap_or_else(|| {
                tracing::debug!(suffix, "unknown duration suffix, using days");
                TimeUnit::Days
            })
        };
        Ok(Duration::new(amount, units))
    }

    /// Adds `other`, converted into this duration's unit.
    pub fn add(&self, other: &Duration, defaults: &TimeUnitDefaults) -> Duration {
        let other = other.convert_units(self.units, defaults);
        Duration::new(self.amount + other.amount, self.units)
    }

    pub fn negate(&self) -> Duration {
        if self.is_zero() {
            *self
        } else {
            Duration::new(-self.amount, self.units)
        }
    }

    pub fn scale(&self, factor: f64) -> Duration {
        Duration::new(self.amount * factor, self.units)
    }

    /// Amount equality within a small tolerance, ignoring units.
    pub fn component_equals(&self, other: &Duration) -> bool {
        (self.amount - other.amount).abs() <= EQUALITY_TOLERANCE
    }

    /// Orders two durations, converting `other` into this unit using an
    /// 8 hour day and a 40 hour week.
    pub fn compare(&self, other: &Duration) -> Ordering {
        let other = other.convert_units(self.units, &TimeUnitDefaults::default());
        if self.component_equals(&other) {
            Ordering::Equal
        } else if self.amount < other.amount {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

fn divide(value: f64, divisor: f64) -> f64 {
    if divisor == 0.0 { 0.0 } else { value / divisor }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.units)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Duration::parse(s, &NumberFormat::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_table_covers_every_unit() {
        for unit in TimeUnit::ALL {
            assert_eq!(TimeUnit::from_suffix(unit.suffix()), Some(unit));
        }
    }

    #[test]
    fn number_format_handles_grouping_and_comma_decimals() {
        let german = NumberFormat::new(',', Some('.'));
        assert_eq!(german.parse("1.234,5"), Some(1234.5));
        assert_eq!(NumberFormat::default().parse("1,234.5"), Some(1234.5));
        assert_eq!(NumberFormat::default().parse("abc"), None);
    }

    #[test]
    fn zero_divisor_yields_zero() {
        let defaults = TimeUnitDefaults::new(0.0, 0.0);
        let result = Duration::convert(16.0, TimeUnit::Hours, TimeUnit::Days, &defaults);
        assert!(result.is_zero());
    }
}
