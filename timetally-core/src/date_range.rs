//! Date ranges for event analysis.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{TallyError, TallyResult};

/// A closed range of calendar dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> TallyResult<Self> {
        if start > end {
            return Err(TallyError::InvalidRange);
        }
        Ok(DateRange { start, end })
    }

    /// Parse "YYYY-MM-DD" bounds.
    pub fn from_args(from: &str, to: &str) -> TallyResult<Self> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    /// The Monday-based week containing `today`.
    pub fn this_week(today: NaiveDate) -> Self {
        let week = today.week(Weekday::Mon);
        DateRange {
            start: week.first_day(),
            end: week.last_day(),
        }
    }

    pub fn last_week(today: NaiveDate) -> Self {
        Self::this_week(today - Days::new(7))
    }

    pub fn this_month(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap();
        DateRange {
            start,
            end: month_end(start),
        }
    }

    pub fn last_month(today: NaiveDate) -> Self {
        let end = today.with_day(1).unwrap() - Days::new(1);
        DateRange {
            start: end.with_day(1).unwrap(),
            end,
        }
    }

    /// Range start as an RFC3339 instant (start of day, UTC).
    pub fn time_min(&self) -> String {
        self.start.and_hms_opt(0, 0, 0).unwrap().and_utc().to_rfc3339()
    }

    /// Range end as an RFC3339 instant (end of day, UTC).
    pub fn time_max(&self) -> String {
        self.end.and_hms_opt(23, 59, 59).unwrap().and_utc().to_rfc3339()
    }
}

/// Last day of the month that `first_day` opens.
fn month_end(first_day: NaiveDate) -> NaiveDate {
    let next_month = if first_day.month() == 12 {
        NaiveDate::from_ymd_opt(first_day.year() + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(first_day.year(), first_day.month() + 1, 1).unwrap()
    };
    next_month - Days::new(1)
}

fn parse_date(s: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| TallyError::InvalidDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_valid_bounds() {
        let range = DateRange::from_args("2024-01-01", "2024-01-07").unwrap();
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 1, 7));
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(matches!(
            DateRange::from_args("01/02/2024", "2024-01-07"),
            Err(TallyError::InvalidDate(_))
        ));
    }

    #[test]
    fn rejects_reversed_bounds() {
        assert!(matches!(
            DateRange::from_args("2024-01-07", "2024-01-01"),
            Err(TallyError::InvalidRange)
        ));
        // A single day is fine
        assert!(DateRange::from_args("2024-01-07", "2024-01-07").is_ok());
    }

    #[test]
    fn this_week_starts_monday() {
        // 2024-01-10 is a Wednesday
        let range = DateRange::this_week(date(2024, 1, 10));
        assert_eq!(range.start, date(2024, 1, 8));
        assert_eq!(range.end, date(2024, 1, 14));

        // A Sunday belongs to the week that started the previous Monday
        let range = DateRange::this_week(date(2024, 1, 14));
        assert_eq!(range.start, date(2024, 1, 8));
    }

    #[test]
    fn last_week_shifts_back_seven_days() {
        let range = DateRange::last_week(date(2024, 1, 10));
        assert_eq!(range.start, date(2024, 1, 1));
        assert_eq!(range.end, date(2024, 1, 7));
    }

    #[test]
    fn month_ranges() {
        let range = DateRange::this_month(date(2024, 2, 15));
        assert_eq!(range.start, date(2024, 2, 1));
        assert_eq!(range.end, date(2024, 2, 29));

        let range = DateRange::last_month(date(2024, 1, 15));
        assert_eq!(range.start, date(2023, 12, 1));
        assert_eq!(range.end, date(2023, 12, 31));
    }

    #[test]
    fn api_bounds_cover_whole_days() {
        let range = DateRange::from_args("2024-01-01", "2024-01-07").unwrap();
        assert_eq!(range.time_min(), "2024-01-01T00:00:00+00:00");
        assert_eq!(range.time_max(), "2024-01-07T23:59:59+00:00");
    }
}
