//! `YYYY-MM-DD` decomposition for historical requests.
use crate::error::{Result, SessionError};
use chrono::NaiveDate;

/// Calendar date split into the fields the historical request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Split `YYYY-MM-DD` into year, month and day.
///
/// ```
/// use trendscope_session::dates::{parse_date_parts, DateParts};
///
/// let parts = parse_date_parts("2023-01-02").unwrap();
/// assert_eq!(parts, DateParts { year: 2023, month: 1, day: 2 });
/// ```
pub fn parse_date_parts(input: &str) -> Result<DateParts> {
    let invalid = |reason: &str| SessionError::InvalidDate {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let normalized = input.replace('-', " ");
    let fields: Vec<&str> = normalized.split_whitespace().collect();
    let [year, month, day] = fields.as_slice() else {
        return Err(invalid("expected YYYY-MM-DD"));
    };

    let year: i32 = year.parse().map_err(|_| invalid("year is not a number"))?;
    let month: u32 = month.parse().map_err(|_| invalid("month is not a number"))?;
    let day: u32 = day.parse().map_err(|_| invalid("day is not a number"))?;

    if NaiveDate::from_ymd_opt(year, month, day).is_none() {
        return Err(invalid("not a calendar date"));
    }
    Ok(DateParts { year, month, day })
}

pub fn check_hour(hour: u32) -> Result<u32> {
    if hour > 23 {
        return Err(SessionError::InvalidHour(hour));
    }
    Ok(hour)
}
