//! Trading-calendar alignment of filing dates.
//!
//! Filing dates are mapped onto the US equity session open so that a filed
//! fact can be joined with market data. The calendar only knows about
//! weekends; exchange holidays are not modelled.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};

/// Hour of the regular session open (Eastern, naive).
pub const MARKET_OPEN_HOUR: u32 = 9;

/// Minute of the regular session open.
pub const MARKET_OPEN_MINUTE: u32 = 30;

/// Date format used by EDGAR for `filed`, `start` and `end`.
pub const FILING_DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns the regular session open time, 09:30.
#[must_use]
pub fn market_open_time() -> NaiveTime {
    NaiveTime::from_hms_opt(MARKET_OPEN_HOUR, MARKET_OPEN_MINUTE, 0).unwrap_or_default()
}

/// Returns true if the date falls Monday through Friday.
#[must_use]
pub fn is_trading_day(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < 5
}

/// Returns the first weekday strictly after `date`.
///
/// # Panics
///
/// Panics if the result would exceed [`NaiveDate::MAX`].
#[must_use]
pub fn next_trading_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Days::new(1);
    while !is_trading_day(next) {
        next = next + Days::new(1);
    }
    next
}

/// Aligns a filing date with the market open on or after it.
///
/// Weekday filings are stamped with 09:30 on the same day, even when the
/// filing was submitted after that time. Saturday and Sunday filings move to
/// 09:30 on the following Monday.
///
/// # Panics
///
/// Panics if the result would exceed [`NaiveDate::MAX`].
#[must_use]
pub fn shift_to_market_open(filing_date: NaiveDate) -> NaiveDateTime {
    let weekday = filing_date.weekday().num_days_from_monday();
    let day = if weekday >= 5 {
        filing_date + Days::new(u64::from(7 - weekday))
    } else {
        filing_date
    };
    day.and_time(market_open_time())
}

/// Parses an EDGAR `YYYY-MM-DD` date, returning `None` when malformed.
///
/// The string must be exactly ten characters of zero-padded digits and
/// dashes. Surrounding whitespace is rejected.
#[must_use]
pub fn parse_filing_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, FILING_DATE_FORMAT).ok()
}
