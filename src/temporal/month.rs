use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Format used for every date written to an artifact
pub const PERIOD_DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a period date from an input file
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY-MM` and the common date-time
/// renderings written by spreadsheet and dataframe exports.
pub fn parse_period_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(Error::MissingData("empty period_date".to_string()));
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    // Month labels such as "2024-03"
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        return Ok(date);
    }

    Err(Error::MissingData(format!("unparseable period_date '{}'", s)))
}

/// Render a date the way artifacts store it
pub fn format_period_date(date: NaiveDate) -> String {
    date.format(PERIOD_DATE_FORMAT).to_string()
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift a month start by `months` (negative moves backwards)
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let start = month_start(date);
    let total = start.year() * 12 + start.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1).unwrap_or(start)
}

/// Start of the month following `date`
///
/// A date that already falls on a month start still rolls forward one month.
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    add_months(date, 1)
}

/// `periods` consecutive month starts beginning at the month of `start`
pub fn monthly_range(start: NaiveDate, periods: usize) -> Vec<NaiveDate> {
    (0..periods).map(|i| add_months(start, i as i32)).collect()
}

/// Whole calendar months from `from` to `to`, ignoring the day of month
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}
