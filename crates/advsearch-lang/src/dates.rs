//! Calendar arithmetic for relative date phrases.
//!
//! Every range is inclusive on both ends and computed against an explicit
//! reference date, so parsing stays deterministic.

use chrono::{Datelike, Days, Months, NaiveDate};

/// An inclusive date range.
pub type DateRange = (NaiveDate, NaiveDate);

/// Calendar unit of a relative phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    /// Parse a unit word, singular or plural.
    pub fn parse(word: &str) -> Option<Unit> {
        match word.trim_end_matches('s') {
            "day" => Some(Unit::Day),
            "week" => Some(Unit::Week),
            "month" => Some(Unit::Month),
            "year" => Some(Unit::Year),
            _ => None,
        }
    }
}

const MONTHS: &[(&str, &str)] = &[
    ("january", "jan"),
    ("february", "feb"),
    ("march", "mar"),
    ("april", "apr"),
    ("may", "may"),
    ("june", "jun"),
    ("july", "jul"),
    ("august", "aug"),
    ("september", "sep"),
    ("october", "oct"),
    ("november", "nov"),
    ("december", "dec"),
];

/// Month number (1-12) of a month name or abbreviation.
pub fn month_number(word: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|(name, abbr)| *name == word || *abbr == word || (word == "sept" && *abbr == "sep"))
        .map(|i| i as u32 + 1)
}

/// The whole of a calendar month.
pub fn month_range(year: i32, month: u32) -> Option<DateRange> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

/// The whole of a calendar year.
pub fn year_range(year: i32) -> Option<DateRange> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// The calendar period containing `today`, shifted `back` periods into the past.
///
/// Weeks start on Monday.
pub fn period(today: NaiveDate, unit: Unit, back: u32) -> Option<DateRange> {
    match unit {
        Unit::Day => {
            let day = today.checked_sub_days(Days::new(back.into()))?;
            Some((day, day))
        }
        Unit::Week => {
            let monday =
                today.checked_sub_days(Days::new(today.weekday().num_days_from_monday().into()))?;
            let start = monday.checked_sub_days(Days::new(7 * u64::from(back)))?;
            Some((start, start.checked_add_days(Days::new(6))?))
        }
        Unit::Month => {
            let first = today.with_day(1)?.checked_sub_months(Months::new(back))?;
            month_range(first.year(), first.month())
        }
        Unit::Year => year_range(today.year().checked_sub(i32::try_from(back).ok()?)?),
    }
}

/// The `count` units leading up to and including `today`.
pub fn trailing(today: NaiveDate, count: u32, unit: Unit) -> Option<DateRange> {
    let start = match unit {
        Unit::Day => today.checked_sub_days(Days::new(count.into()))?,
        Unit::Week => today.checked_sub_days(Days::new(7 * u64::from(count)))?,
        Unit::Month => today.checked_sub_months(Months::new(count))?,
        Unit::Year => today.checked_sub_months(Months::new(count.checked_mul(12)?))?,
    };
    Some((start, today))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Friday
    fn today() -> NaiveDate {
        date(2026, 10, 16)
    }

    #[test]
    fn test_months() {
        assert_eq!(month_number("september"), Some(9));
        assert_eq!(month_number("sept"), Some(9));
        assert_eq!(month_number("dec"), Some(12));
        assert_eq!(month_number("bill"), None);
        assert_eq!(month_range(2024, 2), Some((date(2024, 2, 1), date(2024, 2, 29))));
        assert_eq!(month_range(2026, 12), Some((date(2026, 12, 1), date(2026, 12, 31))));
    }

    #[test]
    fn test_periods() {
        assert_eq!(period(today(), Unit::Day, 1), Some((date(2026, 10, 15), date(2026, 10, 15))));
        assert_eq!(period(today(), Unit::Week, 0), Some((date(2026, 10, 12), date(2026, 10, 18))));
        assert_eq!(period(today(), Unit::Week, 1), Some((date(2026, 10, 5), date(2026, 10, 11))));
        assert_eq!(period(today(), Unit::Month, 1), Some((date(2026, 9, 1), date(2026, 9, 30))));
        assert_eq!(period(date(2026, 1, 31), Unit::Month, 1), Some((date(2025, 12, 1), date(2025, 12, 31))));
        assert_eq!(period(today(), Unit::Year, 1), Some((date(2025, 1, 1), date(2025, 12, 31))));
    }

    #[test]
    fn test_trailing() {
        assert_eq!(trailing(today(), 30, Unit::Day), Some((date(2026, 9, 16), today())));
        assert_eq!(trailing(today(), 2, Unit::Month), Some((date(2026, 8, 16), today())));
        assert_eq!(trailing(today(), 3, Unit::Year), Some((date(2023, 10, 16), today())));
    }

    #[test]
    fn test_out_of_range_spans() {
        assert_eq!(trailing(today(), u32::MAX, Unit::Year), None);
        assert_eq!(trailing(today(), 400_000_000, Unit::Year), None);
        assert_eq!(trailing(today(), u32::MAX, Unit::Day), None);
        assert_eq!(period(today(), Unit::Year, u32::MAX), None);
    }

    #[test]
    fn test_units() {
        assert_eq!(Unit::parse("days"), Some(Unit::Day));
        assert_eq!(Unit::parse("month"), Some(Unit::Month));
        assert_eq!(Unit::parse("hours"), None);
    }
}
