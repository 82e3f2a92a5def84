use chrono::NaiveDate;
use schedule_calendar::recurring::{day_from_mpx_code, day_to_mpx_code};
use schedule_calendar::{
    Day, ProjectCalendarException, RecurrencePattern, RecurrenceType, RecurringData,
    RelativeOrdinal, WeekdaySet,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn days(list: &[Day]) -> WeekdaySet {
    list.iter().copied().collect()
}

#[test]
fn daily_pattern_steps_by_frequency() {
    let data = RecurringData::new(d(2024, 1, 1), RecurrencePattern::Daily { working_days_only: false })
        .every(2)
        .times(3);
    assert_eq!(data.dates(), vec![d(2024, 1, 1), d(2024, 1, 3), d(2024, 1, 5)]);
}

#[test]
fn finish_date_bounds_the_pattern_inclusively() {
    let data = RecurringData::new(d(2024, 1, 1), RecurrencePattern::Daily { working_days_only: false })
        .until(d(2024, 1, 4));
    assert_eq!(data.dates().len(), 4);
    assert_eq!(data.dates().last(), Some(&d(2024, 1, 4)));
}

#[test]
fn occurrences_are_used_when_end_date_is_off() {
    let mut data = RecurringData::new(d(2024, 1, 1), RecurrencePattern::Daily { working_days_only: false })
        .times(2);
    data.finish_date = Some(d(2024, 12, 31));
    assert_eq!(data.dates().len(), 2);
}

#[test]
fn weekly_pattern_skips_days_before_start() {
    let data = RecurringData::new(
        d(2024, 1, 3),
        RecurrencePattern::Weekly {
            days: days(&[Day::Monday, Day::Wednesday]),
        },
    )
    .times(4);
    assert_eq!(
        data.dates(),
        vec![d(2024, 1, 3), d(2024, 1, 8), d(2024, 1, 10), d(2024, 1, 15)]
    );
}

#[test]
fn weekly_pattern_skips_whole_weeks_between_periods() {
    let data = RecurringData::new(
        d(2024, 1, 1),
        RecurrencePattern::Weekly {
            days: days(&[Day::Friday]),
        },
    )
    .every(2)
    .times(3);
    assert_eq!(data.dates(), vec![d(2024, 1, 5), d(2024, 1, 19), d(2024, 2, 2)]);
}

#[test]
fn weekly_pattern_without_days_yields_nothing() {
    let data = RecurringData::new(
        d(2024, 1, 1),
        RecurrencePattern::Weekly {
            days: WeekdaySet::new(),
        },
    )
    .times(5);
    assert!(data.dates().is_empty());
}

#[test]
fn monthly_absolute_clamps_to_month_length() {
    let data = RecurringData::new(d(2024, 1, 15), RecurrencePattern::MonthlyAbsolute { day_number: 31 })
        .times(3);
    assert_eq!(data.dates(), vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31)]);
}

#[test]
fn monthly_absolute_starts_next_month_when_day_has_passed() {
    let data = RecurringData::new(d(2024, 1, 15), RecurrencePattern::MonthlyAbsolute { day_number: 10 })
        .times(2);
    assert_eq!(data.dates(), vec![d(2024, 2, 10), d(2024, 3, 10)]);
}

#[test]
fn monthly_relative_finds_nth_weekday() {
    let data = RecurringData::new(
        d(2024, 1, 1),
        RecurrencePattern::MonthlyRelative {
            ordinal: RelativeOrdinal::Third,
            day: Day::Tuesday,
        },
    )
    .times(2);
    assert_eq!(data.dates(), vec![d(2024, 1, 16), d(2024, 2, 20)]);
}

#[test]
fn monthly_relative_last_weekday_until_finish() {
    let data = RecurringData::new(
        d(2024, 1, 1),
        RecurrencePattern::MonthlyRelative {
            ordinal: RelativeOrdinal::Last,
            day: Day::Friday,
        },
    )
    .until(d(2024, 3, 31));
    assert_eq!(data.dates(), vec![d(2024, 1, 26), d(2024, 2, 23), d(2024, 3, 29)]);
    assert!(data.is_relative());
}

#[test]
fn yearly_absolute_rolls_into_next_year() {
    let data = RecurringData::new(
        d(2024, 3, 1),
        RecurrencePattern::YearlyAbsolute {
            month: 2,
            day_number: 29,
        },
    )
    .times(2);
    assert_eq!(data.dates(), vec![d(2025, 2, 28), d(2026, 2, 28)]);
    assert_eq!(data.recurrence_type(), RecurrenceType::Yearly);
}

#[test]
fn yearly_relative_finds_fourth_thursday() {
    let data = RecurringData::new(
        d(2024, 1, 1),
        RecurrencePattern::YearlyRelative {
            ordinal: RelativeOrdinal::Fourth,
            day: Day::Thursday,
            month: 11,
        },
    )
    .times(2);
    assert_eq!(data.dates(), vec![d(2024, 11, 28), d(2025, 11, 27)]);
}

#[test]
fn zero_frequency_and_occurrences_behave_as_one() {
    let mut data = RecurringData::new(d(2024, 1, 1), RecurrencePattern::Daily { working_days_only: false })
        .every(0);
    data.occurrences = Some(0);
    assert_eq!(data.dates(), vec![d(2024, 1, 1)]);
}

#[test]
fn bitmap_decoding_uses_supplied_masks() {
    let masks = [1, 2, 4, 8, 16, 32, 64];
    let set = WeekdaySet::from_bitmap(0b010_0010, &masks);
    assert!(set.contains(Day::Monday));
    assert!(set.contains(Day::Friday));
    assert!(!set.contains(Day::Sunday));
    assert_eq!(set.len(), 2);
    assert_eq!(set.to_bitmap(&masks), 0b010_0010);
}

#[test]
fn codes_fall_back_to_documented_defaults() {
    assert_eq!(RelativeOrdinal::from_value(7), RelativeOrdinal::Last);
    assert_eq!(RelativeOrdinal::from_value(2), RelativeOrdinal::Second);
    assert_eq!(RecurrenceType::from_mpx_code(3), RecurrenceType::Daily);
    assert_eq!(RecurrenceType::from_mpx_code(16), RecurrenceType::Yearly);
    assert_eq!(RecurrenceType::Monthly.mpx_code(), 8);
    assert_eq!(day_from_mpx_code(1), Day::Monday);
    assert_eq!(day_to_mpx_code(Day::Sunday), 7);
}

#[test]
fn recurring_data_reads_from_json() {
    let json = r#"{
        "start_date": "2024-01-01",
        "occurrences": 2,
        "pattern": { "type": "weekly", "days": ["monday"] }
    }"#;
    let data: RecurringData = serde_json::from_str(json).unwrap();
    assert_eq!(data.frequency, 1);
    assert_eq!(data.dates(), vec![d(2024, 1, 1), d(2024, 1, 8)]);
}

#[test]
fn recurring_exception_expands_to_single_days() {
    let data = RecurringData::new(
        d(2024, 1, 1),
        RecurrencePattern::Weekly {
            days: days(&[Day::Tuesday]),
        },
    )
    .times(2);
    let expanded = ProjectCalendarException::recurring(data).with_name("Standup").expanded();
    assert_eq!(expanded.len(), 2);
    assert_eq!(expanded[0].from_date().date(), d(2024, 1, 2));
    assert_eq!(expanded[1].to_date().date(), d(2024, 1, 9));
    assert!(expanded.iter().all(|e| e.name() == Some("Standup") && !e.is_recurring()));
}
