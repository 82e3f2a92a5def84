use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use schedule_calendar::{
    CalendarError, DateRange, Day, DayType, ProjectCalendarException, ProjectCalendars,
    RecurrencePattern, RecurringData, TimeRange, TimeUnit, TimeUnitDefaults,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn at(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
    d(y, m, day).and_hms_opt(h, min, 0).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// 2024-01-01 is a Monday.
fn standard() -> (ProjectCalendars, schedule_calendar::CalendarId) {
    let mut store = ProjectCalendars::new();
    let id = store.add_base_calendar("Standard");
    (store, id)
}

#[test]
fn exception_bounds_are_inclusive_whole_days() {
    let exception = ProjectCalendarException::from_dates(d(2024, 1, 1), d(2024, 1, 3));
    assert!(exception.contains(at(2024, 1, 1, 0, 0)));
    assert!(exception.contains(d(2024, 1, 3).and_hms_milli_opt(23, 59, 59, 999).unwrap()));
    assert!(!exception.contains(d(2023, 12, 31).and_hms_milli_opt(23, 59, 59, 999).unwrap()));
    assert!(!exception.working());
}

#[test]
fn work_within_a_single_day() {
    let (store, id) = standard();
    let cal = store.view(id).unwrap();
    assert_eq!(cal.work(at(2024, 1, 1, 8, 0), at(2024, 1, 1, 17, 0), TimeUnit::Hours).amount(), 8.0);
    assert_eq!(cal.work(at(2024, 1, 1, 10, 0), at(2024, 1, 1, 14, 0), TimeUnit::Hours).amount(), 3.0);
    assert_eq!(
        cal.work(at(2024, 1, 1, 10, 0), at(2024, 1, 1, 14, 0), TimeUnit::Minutes).amount(),
        180.0
    );
}

#[test]
fn work_across_days_counts_partial_ends() {
    let (store, id) = standard();
    let cal = store.view(id).unwrap();
    let work = cal.work(at(2024, 1, 1, 10, 0), at(2024, 1, 2, 10, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), 8.0);

    let weekend = cal.work(at(2024, 1, 5, 13, 0), at(2024, 1, 8, 12, 0), TimeUnit::Hours);
    assert_eq!(weekend.amount(), 8.0);

    let week = cal.work(at(2024, 1, 1, 8, 0), at(2024, 1, 5, 17, 0), TimeUnit::Days);
    assert_eq!(week.units(), TimeUnit::Days);
    assert_eq!(week.amount(), 5.0);
}

#[test]
fn reversed_bounds_give_negative_work() {
    let (store, id) = standard();
    let cal = store.view(id).unwrap();
    let work = cal.work(at(2024, 1, 2, 10, 0), at(2024, 1, 1, 10, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), -8.0);
    assert!(cal.work(at(2024, 1, 1, 9, 0), at(2024, 1, 1, 9, 0), TimeUnit::Hours).is_zero());
}

#[test]
fn midnight_end_counts_the_whole_previous_day() {
    let (store, id) = standard();
    let cal = store.view(id).unwrap();
    let work = cal.work(at(2024, 1, 1, 0, 0), at(2024, 1, 2, 0, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), 8.0);
}

#[test]
fn holiday_exception_removes_working_time() {
    let (mut store, id) = standard();
    store
        .add_exception(id, ProjectCalendarException::on(d(2024, 1, 2)).with_name("Holiday"))
        .unwrap();
    let cal = store.view(id).unwrap();
    assert!(!cal.is_working_date(d(2024, 1, 2)));
    assert!(cal.is_working_date(d(2024, 1, 3)));
    assert_eq!(cal.work(at(2024, 1, 1, 0, 0), at(2024, 1, 3, 0, 0), TimeUnit::Hours).amount(), 8.0);
    assert_eq!(cal.exception(d(2024, 1, 2)).and_then(|e| e.name()), Some("Holiday"));
}

#[test]
fn working_exception_adds_time_on_a_weekend() {
    let (mut store, id) = standard();
    let exception = ProjectCalendarException::on(d(2024, 1, 6))
        .with_range(TimeRange::from_hm(9, 0, 12, 0))
        .unwrap();
    store.add_exception(id, exception).unwrap();
    let cal = store.view(id).unwrap();
    assert!(cal.is_working_date(d(2024, 1, 6)));
    assert_eq!(cal.work_on_date(d(2024, 1, 6), TimeUnit::Hours).amount(), 3.0);
    assert_eq!(cal.start_time(d(2024, 1, 6)), Some(hm(9, 0)));
    assert_eq!(cal.finish_time(d(2024, 1, 6)), Some(hm(12, 0)));
}

#[test]
fn derived_calendar_inherits_and_overrides() {
    let (mut store, standard) = standard();
    store.add_exception(standard, ProjectCalendarException::on(d(2024, 1, 2))).unwrap();
    let night = store.add_derived_calendar("Night", standard).unwrap();
    let week = store.calendar(night).unwrap().week();
    store.week_mut(week).unwrap().set_working(Day::Monday, false);

    let cal = store.view(night).unwrap();
    assert_eq!(cal.parent().map(|p| p.name()), Some("Standard"));
    assert_eq!(cal.day_type(Day::Monday), DayType::NonWorking);
    assert_eq!(cal.day_type(Day::Wednesday), DayType::Working);
    assert!(!cal.is_working_date(d(2024, 1, 8)));
    assert!(cal.is_working_date(d(2024, 1, 9)));
    assert!(!cal.is_working_date(d(2024, 1, 2)), "parent holiday applies");

    let own = ProjectCalendarException::on(d(2024, 1, 2))
        .with_range(TimeRange::from_hm(9, 0, 10, 0))
        .unwrap();
    store.add_exception(night, own).unwrap();
    let cal = store.view(night).unwrap();
    assert_eq!(cal.ranges(d(2024, 1, 2)).as_ref(), &[TimeRange::from_hm(9, 0, 10, 0)]);
    assert_eq!(store.derived_calendars(standard), vec![night]);
}

#[test]
fn work_week_overrides_main_week_inside_its_range() {
    let (mut store, id) = standard();
    let summer = store
        .add_work_week(id, Some("Summer".into()), DateRange::from_days(d(2024, 7, 1), d(2024, 7, 31)))
        .unwrap();
    {
        let week = store.week_mut(summer).unwrap();
        week.set_working(Day::Friday, false);
        week.set_working(Day::Thursday, true);
        week.add_calendar_hours(Day::Thursday)
            .add_range(TimeRange::from_hm(7, 0, 15, 0));
    }

    let cal = store.view(id).unwrap();
    assert_eq!(cal.work_week(d(2024, 7, 5)), Some(summer));
    assert!(!cal.is_working_date(d(2024, 7, 5)));
    assert!(cal.is_working_date(d(2024, 8, 2)));
    assert_eq!(cal.ranges(d(2024, 7, 4)).as_ref(), &[TimeRange::from_hm(7, 0, 15, 0)]);
    assert_eq!(cal.work_on_date(d(2024, 7, 3), TimeUnit::Hours).amount(), 8.0);
    assert_eq!(cal.work_week(d(2024, 6, 28)), None);
}

#[test]
fn next_work_start_skips_to_the_next_period() {
    let (store, id) = standard();
    let cal = store.view(id).unwrap();
    assert_eq!(cal.next_work_start(at(2024, 1, 5, 17, 0)), at(2024, 1, 8, 8, 0));
    assert_eq!(cal.next_work_start(at(2024, 1, 1, 12, 30)), at(2024, 1, 1, 13, 0));
    assert_eq!(cal.next_work_start(at(2024, 1, 1, 9, 0)), at(2024, 1, 1, 9, 0));
    assert_eq!(cal.next_work_start(at(2024, 1, 6, 10, 0)), at(2024, 1, 8, 8, 0));
}

#[test]
fn next_work_start_gives_up_on_calendars_without_work() {
    let mut store = ProjectCalendars::new();
    let id = store.add_calendar("Closed");
    let week = store.calendar(id).unwrap().week();
    for day in Day::ALL {
        store.week_mut(week).unwrap().set_working(day, false);
    }
    let cal = store.view(id).unwrap();
    assert_eq!(cal.next_work_start(at(2024, 1, 1, 9, 0)), at(2024, 1, 1, 9, 0));
}

#[test]
fn empty_calendar_behaves_as_standard_week() {
    let mut store = ProjectCalendars::new();
    let id = store.add_calendar("Blank");
    let cal = store.view(id).unwrap();
    assert!(cal.is_working_date(d(2024, 1, 1)));
    assert!(!cal.is_working_date(d(2024, 1, 6)));
    assert_eq!(cal.work_on_date(d(2024, 1, 1), TimeUnit::Hours).amount(), 8.0);
    assert_eq!(cal.start_time(d(2024, 1, 6)), None);
}

#[test]
fn duration_in_days_counts_working_dates() {
    let (store, id) = standard();
    let cal = store.view(id).unwrap();
    let days = cal.duration_in_days(d(2024, 1, 1), d(2024, 1, 7));
    assert_eq!(days.units(), TimeUnit::Days);
    assert_eq!(days.amount(), 5.0);
}

#[test]
fn calendar_defaults_drive_unit_conversion() {
    let (mut store, id) = standard();
    store
        .calendar_mut(id)
        .unwrap()
        .set_defaults(Some(TimeUnitDefaults::new(4.0, 20.0)));
    let child = store.add_derived_calendar("Child", id).unwrap();

    let cal = store.view(child).unwrap();
    assert_eq!(cal.defaults(), TimeUnitDefaults::new(4.0, 20.0));
    let work = cal.work(at(2024, 1, 1, 8, 0), at(2024, 1, 1, 17, 0), TimeUnit::Days);
    assert_eq!(work.amount(), 2.0);
}

#[test]
fn midnight_range_covers_the_rest_of_the_day() {
    let (mut store, id) = standard();
    let week = store.calendar(id).unwrap().week();
    store
        .week_mut(week)
        .unwrap()
        .add_calendar_hours(Day::Monday)
        .add_range(TimeRange::from_hm(0, 0, 0, 0));

    let cal = store.view(id).unwrap();
    assert_eq!(cal.work_on_date(d(2024, 1, 1), TimeUnit::Hours).amount(), 24.0);
    assert_eq!(cal.finish_instant(d(2024, 1, 1)), Some(at(2024, 1, 2, 0, 0)));
}

#[test]
fn recurring_exception_applies_on_each_date() {
    let (mut store, id) = standard();
    let first_mondays = RecurringData::new(
        d(2024, 1, 1),
        RecurrencePattern::MonthlyRelative {
            ordinal: schedule_calendar::RelativeOrdinal::First,
            day: Day::Monday,
        },
    )
    .times(3);
    store
        .add_exception(id, ProjectCalendarException::recurring(first_mondays))
        .unwrap();

    let cal = store.view(id).unwrap();
    assert!(!cal.is_working_date(d(2024, 1, 1)));
    assert!(!cal.is_working_date(d(2024, 2, 5)));
    assert!(!cal.is_working_date(d(2024, 3, 4)));
    assert!(cal.is_working_date(d(2024, 1, 8)));
    assert!(cal.is_working_date(d(2024, 4, 1)));
}

#[test]
fn unknown_handles_are_reported() {
    let (mut store, id) = standard();
    let other = ProjectCalendars::new();
    assert!(matches!(other.view(id), Err(CalendarError::UnknownCalendar(_))));
    assert!(store.calendar_by_name("Missing").is_none());
    assert!(store.calendar_mut(id).unwrap().remove_exception(0).is_none());
}

#[test]
fn nested_exceptions_keep_the_outer_span() {
    let (mut store, id) = standard();
    store
        .add_exception(id, ProjectCalendarException::from_dates(d(2024, 1, 1), d(2024, 1, 10)))
        .unwrap();
    let half_day = ProjectCalendarException::on(d(2024, 1, 5))
        .with_range(TimeRange::from_hm(8, 0, 12, 0))
        .unwrap();
    store.add_exception(id, half_day).unwrap();

    assert_eq!(store.calendar(id).unwrap().expanded_exceptions().len(), 2);
    let cal = store.view(id).unwrap();
    assert_eq!(cal.work_on_date(d(2024, 1, 2), TimeUnit::Hours).amount(), 0.0);
    assert_eq!(cal.work_on_date(d(2024, 1, 5), TimeUnit::Hours).amount(), 4.0);
    assert_eq!(cal.work_on_date(d(2024, 1, 9), TimeUnit::Hours).amount(), 0.0);
    assert_eq!(cal.work_on_date(d(2024, 1, 11), TimeUnit::Hours).amount(), 8.0);
}

#[test]
fn single_occurrence_recurrence_outranks_other_recurrences() {
    let (mut store, id) = standard();
    let daily = RecurringData::new(d(2024, 1, 8), RecurrencePattern::Daily { working_days_only: false })
        .times(5);
    store
        .add_exception(id, ProjectCalendarException::recurring(daily))
        .unwrap();
    let one_monday = RecurringData::new(
        d(2024, 1, 8),
        RecurrencePattern::Weekly {
            days: [Day::Monday].into_iter().collect(),
        },
    )
    .times(1);
    let exception = ProjectCalendarException::recurring(one_monday)
        .with_range(TimeRange::from_hm(9, 0, 11, 0))
        .unwrap();
    store.add_exception(id, exception).unwrap();

    let cal = store.view(id).unwrap();
    assert_eq!(cal.work_on_date(d(2024, 1, 8), TimeUnit::Hours).amount(), 2.0);
    assert_eq!(cal.work_on_date(d(2024, 1, 9), TimeUnit::Hours).amount(), 0.0);
    assert_eq!(cal.work_on_date(d(2024, 1, 12), TimeUnit::Hours).amount(), 0.0);
}

#[test]
fn next_work_start_ignores_zero_length_ranges() {
    let (mut store, id) = standard();
    let empty_range = ProjectCalendarException::on(d(2024, 1, 2))
        .with_range(TimeRange::from_hm(9, 0, 9, 0))
        .unwrap();
    store.add_exception(id, empty_range).unwrap();

    let cal = store.view(id).unwrap();
    assert!(!cal.is_working_date(d(2024, 1, 2)));
    assert_eq!(cal.start_time(d(2024, 1, 2)), None);
    assert_eq!(cal.next_work_start(at(2024, 1, 1, 17, 0)), at(2024, 1, 3, 8, 0));
}
