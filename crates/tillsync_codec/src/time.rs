//! Timestamp wire format.
//!
//! Timestamps travel as RFC 3339 strings in UTC with microsecond precision
//! and a trailing `Z`. Decoding is lenient about the input shape: explicit
//! offsets are converted to UTC and naive ISO-8601 strings are taken as UTC.

use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Returns the current time truncated to microseconds.
///
/// All stored and transmitted timestamps use this precision, so values
/// survive a store or wire round trip unchanged.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Formats a timestamp for the wire.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a wire timestamp.
pub fn parse_datetime(text: &str) -> CodecResult<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc).trunc_subsecs(6));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive).trunc_subsecs(6));
        }
    }

    Err(CodecError::invalid_value(format!(
        "not an ISO-8601 timestamp: {text:?}"
    )))
}

/// Formats a calendar date for the wire (`YYYY-MM-DD`).
pub fn format_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Parses a wire calendar date. A full timestamp is accepted and truncated.
pub fn parse_date(text: &str) -> CodecResult<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| parse_datetime(text).map(|dt| dt.date_naive()))
        .map_err(|_| CodecError::invalid_value(format!("not an ISO-8601 date: {text:?}")))
}

/// Converts microseconds since the Unix epoch to a timestamp.
pub fn from_micros(micros: i64) -> CodecResult<DateTime<Utc>> {
    Utc.timestamp_micros(micros)
        .single()
        .ok_or_else(|| CodecError::invalid_value(format!("timestamp out of range: {micros}")))
}
