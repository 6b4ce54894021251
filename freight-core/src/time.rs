//! Temporal utilities for the fixed wire timestamp format
//!
//! Transactions carry shipment-local timestamps as `YYYY-MM-DD HH:MM:SS`
//! strings with no zone. Parsing splits on `-`, space, and `:` rather than
//! using a format string so that a wrong field count is reported as such.

use crate::error::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp
///
/// Fails with [`Error::MalformedTimestamp`] when the field count is not six,
/// any field is non-numeric, or the calendar rejects the values. The wire
/// month is 1-indexed; it passes through the zero-based internal form before
/// the date is built, so `01` is January.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let malformed = || Error::MalformedTimestamp(text.to_string());

    let fields: Vec<&str> = text
        .split(|c| c == '-' || c == ' ' || c == ':')
        .collect();
    if fields.len() != 6 {
        return Err(malformed());
    }

    let mut parts = [0i64; 6];
    for (slot, field) in parts.iter_mut().zip(&fields) {
        *slot = field.parse::<i64>().map_err(|_| malformed())?;
    }
    let [year, month, day, hour, minute, second] = parts;

    // Wire month is 1-indexed; internal arithmetic is zero-based.
    let month0 = month.checked_sub(1).filter(|m| *m >= 0).ok_or_else(malformed)?;

    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year).map_err(|_| malformed())?,
        u32::try_from(month0 + 1).map_err(|_| malformed())?,
        u32::try_from(day).map_err(|_| malformed())?,
    )
    .ok_or_else(malformed)?;

    date.and_hms_opt(
        u32::try_from(hour).map_err(|_| malformed())?,
        u32::try_from(minute).map_err(|_| malformed())?,
        u32::try_from(second).map_err(|_| malformed())?,
    )
    .ok_or_else(malformed)
}

/// Absolute rounded minute difference between two instants
///
/// Symmetric and non-negative.
pub fn minutes_between(a: NaiveDateTime, b: NaiveDateTime) -> i64 {
    let seconds = (b - a).num_seconds();
    ((seconds as f64 / 60.0).round() as i64).abs()
}
