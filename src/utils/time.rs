use chrono::{Datelike, NaiveDate};

/// Start of the rolling lookback window ending at `as_of`, `years` back.
///
/// Falls back to the 28th when the anniversary does not exist (Feb 29).
pub fn lookback_start(as_of: NaiveDate, years: i32) -> NaiveDate {
    let year = as_of.year() - years;
    NaiveDate::from_ymd_opt(year, as_of.month(), as_of.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, as_of.month(), 28))
        .unwrap_or(as_of)
}

/// Inclusive-on-both-ends window membership test.
pub fn within_window(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}

/// Calendar year of a business date.
pub fn calendar_year(date: NaiveDate) -> i32 {
    date.year()
}
