//! HAPI time handling
//!
//! Parses the restricted ISO 8601 forms a HAPI server may emit, rounds to the
//! nearest second, and renders the canonical fixed-precision form
//! `YYYY-MM-DDTHH:MM:SS.ffffffZ`.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};

/// Canonical time format, always UTC with six fractional digits
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Length of a canonical time string
pub const CANONICAL_LEN: usize = 27;

/// Storage width of the `Time` field in reconstructed collections
pub const TIME_WIDTH: usize = 30;

const NANOS_PER_SEC: u32 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid HAPI time: {0:?}")]
pub struct TimeParseError(pub String);

/// Parse a HAPI timestamp.
///
/// Accepts `YYYY-MM-DD` or `YYYY-DDD` dates, optionally followed by `T` and a
/// time truncated at any component (`HH`, `HH:MM`, `HH:MM:SS`, `HH:MM:SS.f…`),
/// optionally followed by `Z`. NUL and space padding is ignored.
pub fn parse_time(text: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let err = || TimeParseError(text.to_string());

    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    let (date_part, time_part) = match trimmed.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (trimmed, None),
    };

    let date = parse_date(date_part).ok_or_else(err)?;
    let time = match time_part {
        Some(t) => parse_clock(t).ok_or_else(err)?,
        None => NaiveTime::MIN,
    };

    Ok(date.and_time(time).and_utc())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = s.split('-').collect();
    match parts.as_slice() {
        [y, m, d] if y.len() == 4 && m.len() == 2 && d.len() == 2 => {
            NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
        }
        [y, doy] if y.len() == 4 && doy.len() == 3 => {
            NaiveDate::from_yo_opt(y.parse().ok()?, doy.parse().ok()?)
        }
        _ => None,
    }
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    if s.is_empty() {
        return Some(NaiveTime::MIN);
    }

    let (hms, fraction) = match s.split_once('.') {
        Some((hms, frac)) => (hms, Some(frac)),
        None => (s, None),
    };

    let fields: Vec<&str> = hms.split(':').collect();
    if fields.is_empty() || fields.len() > 3 || fields.iter().any(|f| f.len() != 2) {
        return None;
    }
    // A fraction only makes sense after seconds
    if fraction.is_some() && fields.len() != 3 {
        return None;
    }

    let mut hms_values = [0u32; 3];
    for (slot, field) in hms_values.iter_mut().zip(&fields) {
        *slot = field.parse().ok()?;
    }

    let nanos = match fraction {
        Some(frac) => parse_fraction(frac)?,
        None => 0,
    };

    NaiveTime::from_hms_nano_opt(hms_values[0], hms_values[1], hms_values[2], nanos)
}

/// Up to nine fractional digits, right-padded to nanoseconds
fn parse_fraction(frac: &str) -> Option<u32> {
    if frac.is_empty() || frac.len() > 9 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: u32 = frac.parse().ok()?;
    Some(digits * 10u32.pow(9 - frac.len() as u32))
}

/// Round to the nearest whole second, ties to even
pub fn round_to_second(time: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = time.nanosecond() % NANOS_PER_SEC;
    let Some(floor) = time.with_nanosecond(0) else {
        return time;
    };

    let half = NANOS_PER_SEC / 2;
    let round_up = match nanos.cmp(&half) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => floor.timestamp().rem_euclid(2) == 1,
    };

    if round_up {
        floor + chrono::Duration::seconds(1)
    } else {
        floor
    }
}

/// Drop everything below a microsecond, matching the canonical precision
pub fn truncate_to_micros(time: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = time.nanosecond();
    time.with_nanosecond(nanos - nanos % 1_000).unwrap_or(time)
}

/// Render in canonical form
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format(CANONICAL_FORMAT).to_string()
}

/// Parse, optionally round, and truncate to canonical precision
pub fn normalize_time(text: &str, round_to_sec: bool) -> Result<DateTime<Utc>, TimeParseError> {
    let parsed = parse_time(text)?;
    let parsed = if round_to_sec { round_to_second(parsed) } else { parsed };
    Ok(truncate_to_micros(parsed))
}

/// Canonicalize a timestamp string. Idempotent on canonical input.
pub fn canonicalize_time(text: &str, round_to_sec: bool) -> Result<String, TimeParseError> {
    normalize_time(text, round_to_sec).map(|t| format_time(&t))
}
