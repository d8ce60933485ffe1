//! UTC helpers for millisecond timestamps

use chrono::{DateTime, TimeZone, Utc};
use crumb_core::QueryError;

/// Largest timestamp magnitude a date can hold: 100,000,000 days
pub const MAX_TIMESTAMP_MS: f64 = 8.64e15;

/// Convert a millisecond timestamp to a UTC datetime.
///
/// Fractional milliseconds are truncated toward zero.
pub fn from_millis(function: &str, millis: f64) -> Result<DateTime<Utc>, QueryError> {
    let invalid = || QueryError::InvalidTimestamp {
        function: function.to_string(),
        value: millis,
    };

    if !millis.is_finite() || millis.abs() > MAX_TIMESTAMP_MS {
        return Err(invalid());
    }

    Utc.timestamp_millis_opt(millis.trunc() as i64)
        .single()
        .ok_or_else(invalid)
}

/// Current time in milliseconds since the epoch
pub fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// Format as `Sun, 13 Nov 2022 01:55:18 GMT`
pub fn to_utc_string(datetime: &DateTime<Utc>) -> String {
    datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
