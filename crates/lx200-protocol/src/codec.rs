//! Sexagesimal field codec.
//!
//! LX200 controllers exchange coordinates as fixed-width ASCII fields:
//!
//! | Quantity              | Wire form    | Range handling            |
//! |-----------------------|--------------|---------------------------|
//! | Right ascension       | `HH:MM:SS`   | wrapped into `[0, 24)`    |
//! | Declination, altitude | `sDD*MM:SS`  | explicit sign, no wrap    |
//! | Azimuth, longitude    | `DDD*MM:SS`  | wrapped into `[0, 360)`   |
//! | UTC offset            | `sHH:MM:SS`  | explicit sign             |
//! | Tracking rate         | `s0.0000`    | explicit sign, 4 decimals |
//!
//! Seconds are truncated, never rounded: encoding and decoding a value only
//! recovers it to the whole second.
//!
//! All functions are pure. Range validation of the input (declination
//! within ±90°, finite values) is the caller's job; [`ensure_in_range`] and
//! [`ensure_finite`] are provided for it.

use lx200_core::{Error, Result};

/// Decimal places the controllers expect in tracking-rate fields.
pub const RATE_PRECISION: usize = 4;

const SECONDS_PER_HOUR: u64 = 3600;
const HOURS_PER_DAY: f64 = 24.0;
const DEGREES_PER_TURN: f64 = 360.0;

/// Absorbs binary floating-point error so that a value such as
/// `12.5 / 3600 * 3600` truncates to 12.5 s and not 12.4999 s.
const TRUNCATION_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------

/// Whole seconds in `|value|` units, truncated toward zero.
fn whole_seconds(value: f64) -> u64 {
    (value.abs() * SECONDS_PER_HOUR as f64 + TRUNCATION_EPSILON).floor() as u64
}

/// Split a whole number of seconds into (units, minutes, seconds).
fn split(total: u64) -> (u64, u64, u64) {
    (
        total / SECONDS_PER_HOUR,
        (total / 60) % 60,
        total % 60,
    )
}

/// Reduce `value` into `[0, period)`.
///
/// `rem_euclid` can land exactly on `period` for tiny negative inputs, so
/// that case folds back to zero.
fn wrap(value: f64, period: f64) -> f64 {
    let wrapped = value.rem_euclid(period);
    if wrapped >= period { 0.0 } else { wrapped }
}

/// Split a wrapped value, pinning anything that truncates onto the wrap
/// boundary to the last representable second below it.
fn split_wrapped(value: f64, period: f64) -> (u64, u64, u64) {
    let limit = period as u64 * SECONDS_PER_HOUR - 1;
    split(whole_seconds(wrap(value, period)).min(limit))
}

fn sign_of(value: f64) -> char {
    if value < 0.0 { '-' } else { '+' }
}

// ---------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------

/// Encode right ascension in hours as `HH:MM:SS`.
///
/// ```
/// use lx200_protocol::codec::encode_ra;
///
/// assert_eq!(encode_ra(12.5), "12:30:00");
/// assert_eq!(encode_ra(-1.0), "23:00:00");
/// ```
pub fn encode_ra(hours: f64) -> String {
    let (h, m, s) = split_wrapped(hours, HOURS_PER_DAY);
    format!("{h:02}:{m:02}:{s:02}")
}

/// Encode declination in degrees as `sDD*MM:SS`.
pub fn encode_dec(degrees: f64) -> String {
    encode_signed_degrees(degrees)
}

/// Encode azimuth in degrees as `DDD*MM:SS`, wrapped into `[0, 360)`.
pub fn encode_az(degrees: f64) -> String {
    let (d, m, s) = split_wrapped(degrees, DEGREES_PER_TURN);
    format!("{d:03}*{m:02}:{s:02}")
}

/// Encode altitude in degrees as `sDD*MM:SS`.
pub fn encode_alt(degrees: f64) -> String {
    encode_signed_degrees(degrees)
}

/// Site longitude uses the azimuth form (`DDD*MM:SS`, `[0, 360)`).
pub fn encode_longitude(degrees: f64) -> String {
    encode_az(degrees)
}

/// Site latitude uses the declination form (`sDD*MM:SS`).
pub fn encode_latitude(degrees: f64) -> String {
    encode_signed_degrees(degrees)
}

/// Encode a UTC offset in hours as `sHH:MM:SS`.
pub fn encode_utc_offset(hours: f64) -> String {
    let (h, m, s) = split(whole_seconds(hours));
    format!("{}{h:02}:{m:02}:{s:02}", sign_of(hours))
}

/// Encode a signed rate with `precision` decimals and an explicit sign.
///
/// ```
/// use lx200_protocol::codec::encode_signed_rate;
///
/// assert_eq!(encode_signed_rate(1.5, 4), "+1.5000");
/// assert_eq!(encode_signed_rate(-0.25, 4), "-0.2500");
/// ```
pub fn encode_signed_rate(rate: f64, precision: usize) -> String {
    format!("{}{:.*}", sign_of(rate), precision, rate.abs())
}

fn encode_signed_degrees(degrees: f64) -> String {
    let (d, m, s) = split(whole_seconds(degrees));
    format!("{}{d:02}*{m:02}:{s:02}", sign_of(degrees))
}

// ---------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------

fn is_separator(c: char) -> bool {
    matches!(c, ':' | '*' | '\'' | '"' | ' ' | '\u{b0}')
}

/// Parse a sexagesimal field into a signed decimal value.
///
/// Accepts one to three numeric parts (`D`, `D:M`, `D:M:S`), any of the
/// separators the controllers use (`:`, `*`, `'`, `°`), an optional sign,
/// a fractional last part (`12:34.5`), and a trailing `#`.
///
/// ```
/// use lx200_protocol::codec::parse_sexagesimal;
///
/// assert_eq!(parse_sexagesimal("-05:30:00#").unwrap(), -5.5);
/// assert_eq!(parse_sexagesimal("+45*30").unwrap(), 45.5);
/// ```
pub fn parse_sexagesimal(text: &str) -> Result<f64> {
    let body = text.trim().trim_end_matches('#').trim_end();
    let malformed = || Error::Protocol(format!("malformed sexagesimal field: {text:?}"));

    let (negative, digits) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body.strip_prefix('+').unwrap_or(body)),
    };

    let parts: Vec<&str> = digits.split(is_separator).collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(malformed());
    }

    let mut value = 0.0;
    let mut scale = 1.0;
    for (index, part) in parts.iter().enumerate() {
        let last = index + 1 == parts.len();
        let valid = !part.is_empty()
            && part.chars().all(|c| c.is_ascii_digit() || (last && c == '.'));
        if !valid {
            return Err(malformed());
        }
        let number: f64 = part.parse().map_err(|_| malformed())?;
        if index > 0 && number >= 60.0 {
            return Err(malformed());
        }
        value += number / scale;
        scale *= 60.0;
    }

    Ok(if negative { -value } else { value })
}

/// Decode a right-ascension field into hours in `[0, 24)`.
pub fn decode_ra(text: &str) -> Result<f64> {
    let hours = parse_sexagesimal(text)?;
    if !(0.0..HOURS_PER_DAY).contains(&hours) {
        return Err(Error::Protocol(format!(
            "right ascension out of range: {text:?}"
        )));
    }
    Ok(hours)
}

/// Decode a declination field into degrees in `[-90, 90]`.
pub fn decode_dec(text: &str) -> Result<f64> {
    let degrees = parse_sexagesimal(text)?;
    if !(-90.0..=90.0).contains(&degrees) {
        return Err(Error::Protocol(format!("declination out of range: {text:?}")));
    }
    Ok(degrees)
}

/// Decode an azimuth field into degrees in `[0, 360)`.
pub fn decode_az(text: &str) -> Result<f64> {
    let degrees = parse_sexagesimal(text)?;
    if !(0.0..DEGREES_PER_TURN).contains(&degrees) {
        return Err(Error::Protocol(format!("azimuth out of range: {text:?}")));
    }
    Ok(degrees)
}

// ---------------------------------------------------------------
// Caller-side validation
// ---------------------------------------------------------------

/// Reject NaN and infinities before they reach an encoder.
pub fn ensure_finite(what: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::OutOfRange(format!("{what} must be finite, got {value}")))
    }
}

/// Reject values outside `[min, max]` (and non-finite values).
pub fn ensure_in_range(what: &str, value: f64, min: f64, max: f64) -> Result<f64> {
    ensure_finite(what, value)?;
    if value < min || value > max {
        return Err(Error::OutOfRange(format!(
            "{what} {value} outside [{min}, {max}]"
        )));
    }
    Ok(value)
}
