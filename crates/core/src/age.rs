//! Calendar-aware elapsed time and participant age.
//!
//! Ages are computed field by field (years, months, days, hours, minutes,
//! seconds) with borrows carried from the smallest unit upwards, so a person
//! born on the 29th of February or at 23:59 gets an exact calendar age rather
//! than a 365-day approximation.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::types::Timestamp;

/// Elapsed calendar time between two instants, normalized so that every
/// field except `years` is within its natural range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Elapsed {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
}

/// Number of days in the given month, found by probing down from day 31
/// until a valid date is produced.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    (28..=31)
        .rev()
        .find(|day| NaiveDate::from_ymd_opt(year, month, *day).is_some())
        .unwrap_or(28)
}

/// Compute the elapsed calendar time from `start` to `end`.
///
/// When `start` is after `end` the result has a negative `years` field.
pub fn elapsed_between(start: Timestamp, end: Timestamp) -> Elapsed {
    let mut years = end.year() - start.year();
    let mut months = end.month() as i32 - start.month() as i32;
    let mut days = end.day() as i32 - start.day() as i32;
    let mut hours = end.hour() as i32 - start.hour() as i32;
    let mut minutes = end.minute() as i32 - start.minute() as i32;
    let mut seconds = end.second() as i32 - start.second() as i32;

    if seconds < 0 {
        seconds += 60;
        minutes -= 1;
    }
    if minutes < 0 {
        minutes += 60;
        hours -= 1;
    }
    if hours < 0 {
        hours += 24;
        days -= 1;
    }
    if days < 0 {
        days += days_in_month(start.year(), start.month()) as i32;
        months -= 1;
    }
    if months < 0 {
        months += 12;
        years -= 1;
    }

    Elapsed {
        years,
        months,
        days,
        hours,
        minutes,
        seconds,
    }
}

/// Whole elapsed years between a birth instant and `now`.
pub fn age_in_years(birth: Timestamp, now: Timestamp) -> i32 {
    elapsed_between(birth, now).years
}

/// Parse a stored date of birth.
///
/// Accepts a plain `YYYY-MM-DD` date (interpreted as midnight UTC) or a full
/// RFC 3339 timestamp. Returns `None` for anything else.
pub fn parse_date_of_birth(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn month_lengths_follow_the_calendar() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 4), 30);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn exact_fields_without_borrow() {
        let e = elapsed_between(at(2000, 1, 10, 8, 5, 3), at(2020, 3, 12, 10, 9, 7));
        assert_eq!(
            e,
            Elapsed {
                years: 20,
                months: 2,
                days: 2,
                hours: 2,
                minutes: 4,
                seconds: 4
            }
        );
    }

    #[test]
    fn borrows_cascade_from_seconds_to_years() {
        // One second short of exactly ten years.
        let e = elapsed_between(at(2010, 6, 15, 12, 0, 0), at(2020, 6, 15, 11, 59, 59));
        assert_eq!(e.years, 9);
        assert_eq!(e.months, 11);
        assert_eq!(e.seconds, 59);
        assert_eq!(e.minutes, 59);
        assert_eq!(e.hours, 23);
    }

    #[test]
    fn negative_days_borrow_birth_month_length() {
        // Born 20 Feb 2023 (28-day month), measured on 5 Mar 2023.
        let e = elapsed_between(at(2023, 2, 20, 0, 0, 0), at(2023, 3, 5, 0, 0, 0));
        assert_eq!(e.months, 0);
        assert_eq!(e.days, 13);
    }

    #[test]
    fn one_day_past_birthday_counts_the_year() {
        let now = at(2026, 6, 15, 12, 0, 0);
        assert_eq!(age_in_years(at(2008, 6, 14, 12, 0, 0), now), 18);
    }

    #[test]
    fn one_day_before_birthday_does_not_count_the_year() {
        let now = at(2026, 6, 15, 12, 0, 0);
        assert_eq!(age_in_years(at(2008, 6, 16, 12, 0, 0), now), 17);
    }

    #[test]
    fn leap_day_birth() {
        let birth = at(2004, 2, 29, 0, 0, 0);
        assert_eq!(age_in_years(birth, at(2022, 2, 28, 23, 59, 59)), 17);
        assert_eq!(age_in_years(birth, at(2022, 3, 1, 0, 0, 0)), 18);
    }

    #[test]
    fn future_birth_is_negative() {
        assert!(age_in_years(at(2030, 1, 1, 0, 0, 0), at(2026, 1, 1, 0, 0, 0)) < 0);
    }

    #[test]
    fn parses_plain_dates_and_rfc3339() {
        assert_eq!(parse_date_of_birth("2001-04-09"), Some(at(2001, 4, 9, 0, 0, 0)));
        assert_eq!(
            parse_date_of_birth("2001-04-09T10:30:00+02:00"),
            Some(at(2001, 4, 9, 8, 30, 0))
        );
    }

    #[test]
    fn rejects_garbage_dates() {
        assert_eq!(parse_date_of_birth(""), None);
        assert_eq!(parse_date_of_birth("09.04.2001"), None);
        assert_eq!(parse_date_of_birth("2001-02-30"), None);
    }
}
