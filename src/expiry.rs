//! Duration-spec parsing and base36 timestamps.
//!
//! Expiry windows are configured as compact spec strings (`"1h"`, `"30m"`,
//! `"0s"`, or a bare number of milliseconds). The keyed-hash engine embeds
//! the spec verbatim inside its tokens and re-parses it at verify time, so
//! the grammar here is part of the wire format.

use crate::error::{CsrfError, Result};
use std::time::Duration;

const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Parse a duration spec into a `Duration`.
///
/// Accepted units: `ms`, `s`/`sec`/`secs`, `m`/`min`/`mins`, `h`/`hr`/`hrs`,
/// `d`/`day`/`days`, `w`/`week`/`weeks`, `y`/`yr`/`yrs`. A bare number is
/// milliseconds. Fractional values are allowed (`"1.5h"`).
pub fn parse_spec(spec: &str) -> Result<Duration> {
    let s = spec.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);

    let value: f64 = num
        .parse()
        .map_err(|_| CsrfError::Config(format!("invalid duration spec: {spec:?}")))?;

    let unit_ms = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        "y" | "yr" | "yrs" | "year" | "years" => 31_557_600_000.0,
        _ => {
            return Err(CsrfError::Config(format!(
                "invalid duration unit in spec: {spec:?}"
            )));
        }
    };

    let millis = value * unit_ms;
    if !millis.is_finite() || millis < 0.0 {
        return Err(CsrfError::Config(format!("invalid duration spec: {spec:?}")));
    }

    Ok(Duration::from_millis(millis as u64))
}

/// Encode an unsigned integer in lowercase base36, the way JavaScript's
/// `Number.prototype.toString(36)` renders timestamps.
pub(crate) fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(BASE36_DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).expect("base36 digits are ASCII")
}

/// Decode a lowercase base36 string. Returns `None` on empty input,
/// non-base36 characters, or overflow.
pub(crate) fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for c in s.bytes() {
        let digit = match c {
            b'0'..=b'9' => (c - b'0') as u64,
            b'a'..=b'z' => (c - b'a') as u64 + 10,
            _ => return None,
        };
        n = n.checked_mul(36)?.checked_add(digit)?;
    }
    Some(n)
}
