//! Duration specs such as `5s`, `1min`, `2H`, `500ms` or `5 minutes`

use chrono::Duration;
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

const INTERVAL_PATTERN: &str = r"^(\d+(?:\.\d+)?)\s*([A-Za-z]+)$";

static INTERVAL_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// Compiled once per process
fn interval_regex() -> Option<&'static Regex> {
    INTERVAL_RE.get_or_init(|| Regex::new(INTERVAL_PATTERN).ok()).as_ref()
}

/// A positive time step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval(Duration);

impl Interval {
    pub fn new(duration: Duration) -> Result<Self, IntervalError> {
        if duration <= Duration::zero() {
            return Err(IntervalError::NonPositive(duration.to_string()));
        }
        Ok(Self(duration))
    }

    pub fn seconds(secs: i64) -> Result<Self, IntervalError> {
        Self::new(Duration::seconds(secs))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl FromStr for Interval {
    type Err = IntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || IntervalError::Invalid(s.to_string());

        let re = interval_regex().ok_or_else(invalid)?;
        let caps = re.captures(s.trim()).ok_or_else(invalid)?;

        let value: f64 = caps[1].parse().map_err(|_| invalid())?;
        let nanos_per_unit = unit_nanos(&caps[2]).ok_or_else(invalid)?;

        let nanos = (value * nanos_per_unit as f64).round();
        if !nanos.is_finite() || nanos > i64::MAX as f64 {
            return Err(invalid());
        }
        Interval::new(Duration::nanoseconds(nanos as i64))
    }
}

fn unit_nanos(unit: &str) -> Option<i64> {
    const SEC: i64 = 1_000_000_000;
    let nanos = match unit.to_lowercase().as_str() {
        "ns" | "nanosecond" | "nanoseconds" => 1,
        "us" | "u" | "microsecond" | "microseconds" => 1_000,
        "ms" | "l" | "millisecond" | "milliseconds" => 1_000_000,
        "s" | "sec" | "secs" | "second" | "seconds" => SEC,
        "m" | "t" | "min" | "mins" | "minute" | "minutes" => 60 * SEC,
        "h" | "hr" | "hour" | "hours" => 3600 * SEC,
        "d" | "day" | "days" => 86400 * SEC,
        _ => return None,
    };
    Some(nanos)
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.num_nanoseconds() {
            Some(ns) if ns % 1_000_000_000 == 0 => write!(f, "{}s", ns / 1_000_000_000),
            Some(ns) if ns % 1_000_000 == 0 => write!(f, "{}ms", ns / 1_000_000),
            Some(ns) => write!(f, "{}ns", ns),
            None => write!(f, "{}s", self.0.num_seconds()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    #[error("Invalid interval: {0}")]
    Invalid(String),

    #[error("Interval must be positive, got {0}")]
    NonPositive(String),
}
