//! Chargeable-day calculation for a leave date range.
//!
//! Weekdays are always charged. Weekend days are charged only when they
//! directly follow a Friday inside the range: someone who is off on Friday is
//! understood to be away until the following Monday.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Represents the type of day for chargeable-day calculation.
///
/// # Example
///
/// ```
/// use leave_engine::calculation::DayType;
///
/// let day_type = DayType::Saturday;
/// assert_eq!(format!("{:?}", day_type), "Saturday");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    /// Monday through Friday, always chargeable.
    Weekday,
    /// Saturday, chargeable only after an in-range Friday.
    Saturday,
    /// Sunday, chargeable only after an in-range Friday.
    Sunday,
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayType::Weekday => write!(f, "Weekday"),
            DayType::Saturday => write!(f, "Saturday"),
            DayType::Sunday => write!(f, "Sunday"),
        }
    }
}

/// Determines the day type for a given date.
///
/// # Example
///
/// ```
/// use leave_engine::calculation::{get_day_type, DayType};
/// use chrono::NaiveDate;
///
/// // 2025-08-16 is a Saturday
/// let saturday = NaiveDate::from_ymd_opt(2025, 8, 16).unwrap();
/// assert_eq!(get_day_type(saturday), DayType::Saturday);
///
/// // 2025-08-11 is a Monday
/// let monday = NaiveDate::from_ymd_opt(2025, 8, 11).unwrap();
/// assert_eq!(get_day_type(monday), DayType::Weekday);
/// ```
pub fn get_day_type(date: NaiveDate) -> DayType {
    match date.weekday() {
        Weekday::Sat => DayType::Saturday,
        Weekday::Sun => DayType::Sunday,
        _ => DayType::Weekday,
    }
}

/// Breakdown of the days a range charges against a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayCount {
    /// `weekday_count + weekend_count`.
    pub total: u32,
    /// Monday–Friday days in the range.
    pub weekday_count: u32,
    /// Saturdays and Sundays charged because they follow an in-range Friday.
    pub weekend_count: u32,
}

/// Returns the last day the employee is away, given the requested end date.
///
/// A range ending on Friday runs through the following Sunday.
pub fn working_end(end: NaiveDate) -> NaiveDate {
    if end.weekday() == Weekday::Fri {
        end.checked_add_signed(Duration::days(2)).unwrap_or(end)
    } else {
        end
    }
}

/// How many times `weekday` occurs among `len` consecutive days starting on
/// `first`.
fn occurrences(first: Weekday, len: i64, weekday: Weekday) -> i64 {
    let offset = (weekday.num_days_from_monday() as i64 - first.num_days_from_monday() as i64)
        .rem_euclid(7);
    len / 7 + i64::from(offset < len % 7)
}

/// Converts an inclusive date range into a chargeable-day count.
///
/// # Behavior
///
/// - `start > end` yields all zeros; the range is treated as empty
/// - Every Monday–Friday in `[start, working_end(end)]` is charged
/// - Each Friday in that range also charges the Saturday and Sunday after it
/// - Any other weekend day is free
///
/// The result depends on the inputs only.
///
/// # Example
///
/// ```
/// use leave_engine::calculation::chargeable_days;
/// use chrono::NaiveDate;
///
/// let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
///
/// // Monday to Friday: five weekdays plus the weekend that follows
/// let count = chargeable_days(d(8, 11), d(8, 15));
/// assert_eq!((count.total, count.weekday_count, count.weekend_count), (7, 5, 2));
///
/// // A lone Friday
/// let count = chargeable_days(d(12, 26), d(12, 26));
/// assert_eq!((count.total, count.weekday_count, count.weekend_count), (3, 1, 2));
/// ```
pub fn chargeable_days(start: NaiveDate, end: NaiveDate) -> DayCount {
    if start > end {
        return DayCount::default();
    }

    // Extending a Friday end to Sunday adds no weekday, so counting over
    // [start, end] is enough. Constant time in the length of the range.
    let len = (end - start).num_days() + 1;
    let first = start.weekday();
    let weekdays: i64 = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
    ]
    .into_iter()
    .map(|day| occurrences(first, len, day))
    .sum();
    let fridays = occurrences(first, len, Weekday::Fri);

    let weekday_count = u32::try_from(weekdays).unwrap_or(u32::MAX);
    let weekend_count = u32::try_from(fridays * 2).unwrap_or(u32::MAX);
    DayCount {
        total: weekday_count.saturating_add(weekend_count),
        weekday_count,
        weekend_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn count(start: &str, end: &str) -> (u32, u32, u32) {
        let c = chargeable_days(make_date(start), make_date(end));
        (c.total, c.weekday_count, c.weekend_count)
    }

    // ==========================================================================
    // DR-001: Monday to Thursday charges only weekdays
    // ==========================================================================
    #[test]
    fn test_dr_001_monday_to_thursday() {
        assert_eq!(count("2025-08-11", "2025-08-14"), (4, 4, 0));
    }

    // ==========================================================================
    // DR-002: Monday to Friday charges the following weekend
    // ==========================================================================
    #[test]
    fn test_dr_002_monday_to_friday() {
        assert_eq!(count("2025-08-11", "2025-08-15"), (7, 5, 2));
    }

    // ==========================================================================
    // DR-003: A lone Friday charges three days
    // ==========================================================================
    #[test]
    fn test_dr_003_lone_friday() {
        assert_eq!(count("2025-12-26", "2025-12-26"), (3, 1, 2));
    }

    // ==========================================================================
    // DR-004: Inverted range is empty
    // ==========================================================================
    #[test]
    fn test_dr_004_start_after_end_is_zero() {
        assert_eq!(count("2025-08-15", "2025-08-11"), (0, 0, 0));
    }

    #[test]
    fn test_two_weeks_charges_both_weekends() {
        // Mon 2025-08-11 .. Fri 2025-08-22
        assert_eq!(count("2025-08-11", "2025-08-22"), (14, 10, 4));
    }

    #[test]
    fn test_range_spanning_a_weekend_charges_it() {
        // Thu 2025-08-14 .. Tue 2025-08-19: Friday inside, weekend follows
        assert_eq!(count("2025-08-14", "2025-08-19"), (6, 4, 2));
    }

    #[test]
    fn test_weekend_without_friday_is_free() {
        // Sat 2025-08-16 .. Tue 2025-08-19
        assert_eq!(count("2025-08-16", "2025-08-19"), (2, 2, 0));
    }

    #[test]
    fn test_weekend_only_range_is_zero() {
        assert_eq!(count("2025-08-16", "2025-08-17"), (0, 0, 0));
    }

    #[test]
    fn test_friday_to_saturday_still_charges_sunday() {
        assert_eq!(count("2025-08-15", "2025-08-16"), (3, 1, 2));
    }

    #[test]
    fn test_working_end_extends_friday_only() {
        assert_eq!(working_end(make_date("2025-08-15")), make_date("2025-08-17"));
        assert_eq!(working_end(make_date("2025-08-14")), make_date("2025-08-14"));
        assert_eq!(working_end(make_date("2025-08-16")), make_date("2025-08-16"));
    }

    #[test]
    fn test_range_across_year_end() {
        // Wed 2025-12-31 .. Fri 2026-01-02
        assert_eq!(count("2025-12-31", "2026-01-02"), (5, 3, 2));
    }

    #[test]
    fn test_widest_range_is_counted_without_walking_it() {
        let c = chargeable_days(NaiveDate::MIN, NaiveDate::MAX);
        let len = (NaiveDate::MAX - NaiveDate::MIN).num_days() + 1;
        let weeks = (len / 7) as u32;
        assert!((weeks * 5..=weeks * 5 + 5).contains(&c.weekday_count));
        assert!((weeks * 2..=weeks * 2 + 2).contains(&c.weekend_count));
        assert_eq!(c.total, c.weekday_count + c.weekend_count);
    }

    #[test]
    fn test_friday_at_calendar_end_does_not_overflow() {
        let mut last_friday = NaiveDate::MAX;
        while last_friday.weekday() != Weekday::Fri {
            last_friday = last_friday.pred_opt().unwrap();
        }
        assert_eq!(working_end(NaiveDate::MAX), NaiveDate::MAX);
        assert_eq!(chargeable_days(last_friday, last_friday).total, 3);
    }

    fn walked(start: NaiveDate, end: NaiveDate) -> (u32, u32) {
        let mut weekdays = 0;
        let mut fridays = 0;
        for date in start.iter_days().take_while(|d| *d <= end) {
            if get_day_type(date) == DayType::Weekday {
                weekdays += 1;
            }
            if date.weekday() == Weekday::Fri {
                fridays += 1;
            }
        }
        (weekdays, fridays * 2)
    }

    fn any_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| make_date("2020-01-01") + Duration::days(offset))
    }

    proptest! {
        #[test]
        fn prop_total_is_sum_of_parts(start in any_date(), len in 0i64..120) {
            let c = chargeable_days(start, start + Duration::days(len));
            prop_assert_eq!(c.total, c.weekday_count + c.weekend_count);
        }

        #[test]
        fn prop_matches_day_by_day_count(start in any_date(), len in 0i64..400) {
            let end = start + Duration::days(len);
            let c = chargeable_days(start, end);
            prop_assert_eq!((c.weekday_count, c.weekend_count), walked(start, end));
        }

        #[test]
        fn prop_is_idempotent(start in any_date(), end in any_date()) {
            prop_assert_eq!(chargeable_days(start, end), chargeable_days(start, end));
        }

        #[test]
        fn prop_weekend_is_two_per_friday(start in any_date(), len in 0i64..120) {
            let end = start + Duration::days(len);
            let fridays = start
                .iter_days()
                .take_while(|d| *d <= end)
                .filter(|d| d.weekday() == Weekday::Fri)
                .count() as u32;
            prop_assert_eq!(chargeable_days(start, end).weekend_count, fridays * 2);
        }

        #[test]
        fn prop_inverted_ranges_are_empty(start in any_date(), gap in 1i64..400) {
            let c = chargeable_days(start, start - Duration::days(gap));
            prop_assert_eq!(c, DayCount::default());
        }

        #[test]
        fn prop_weekdays_never_exceed_range_length(start in any_date(), len in 0i64..120) {
            let c = chargeable_days(start, start + Duration::days(len));
            prop_assert!(c.weekday_count as i64 <= len + 1);
        }
    }
}
