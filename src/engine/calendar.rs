//! Calendar day counting for the averaging cycle
//!
//! The cycle starts on Jan 1 of the observation year. All day counts used by
//! the engine are 0-based offsets from that date, so Jan 1 maps to day 0.

use chrono::{Datelike, Duration, NaiveDate};

/// 1-based day of year (Jan 1 = 1, Dec 31 = 365 or 366)
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Day offset from Jan 1 of the date's own year (Jan 1 = 0)
///
/// This is the unit used for both elapsed days and target days.
pub fn day_offset(date: NaiveDate) -> u32 {
    day_of_year(date).saturating_sub(1)
}

/// Dec 31 of the given date's year
pub fn year_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date)
}

/// Day offset of Dec 31 in the date's year (364, or 365 in leap years)
pub fn year_end_offset(date: NaiveDate) -> u32 {
    day_offset(year_end(date))
}

/// Date reached by holding a balance for `extra_days` more days after `from`
///
/// Fractional day counts round up: a threshold reached part way through a day
/// only counts once that day is complete. Returns `None` for `+∞`, `NaN`, or
/// a count that overflows the calendar.
pub fn date_after_days(from: NaiveDate, extra_days: f64) -> Option<NaiveDate> {
    if !extra_days.is_finite() || extra_days < 0.0 {
        return None;
    }
    let whole = extra_days.ceil();
    if whole > i32::MAX as f64 {
        return None;
    }
    from.checked_add_signed(Duration::days(whole as i64))
}

/// Parse a calendar date from form or CSV text
///
/// Accepts `YYYY-MM-DD` and `YYYY/MM/DD`. Surrounding whitespace is ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .ok()
}
