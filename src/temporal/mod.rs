//! Calendar-month handling for monthly series

mod month;

pub use self::month::{
    add_months, format_period_date, month_start, monthly_range, months_between, next_month_start,
    parse_period_date, PERIOD_DATE_FORMAT,
};
