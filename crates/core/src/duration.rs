//! Duration normalisation.
//!
//! Registry age limits arrive as `<integer> <unit>` strings (`18 Years`, `6 Months`,
//! `28 Days`). This module converts them to fractional years so they can be compared
//! against a patient's age.

use crate::{MatchError, MatchResult};
use regex::Regex;
use std::sync::LazyLock;

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(years?|months?|days?|hours?|minutes?)\s*$")
        .expect("Invalid duration regex")
});

/// Units accepted in a duration string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
}

impl DurationUnit {
    /// Divisor applied to the magnitude to yield years.
    pub fn divisor(self) -> f64 {
        match self {
            DurationUnit::Years => 1.0,
            DurationUnit::Months => 12.0,
            DurationUnit::Days => 365.0,
            DurationUnit::Hours => 365.0 * 24.0,
            DurationUnit::Minutes => 365.0 * 24.0 * 60.0,
        }
    }

    fn from_match(unit: &str) -> Option<Self> {
        let unit = unit.to_ascii_lowercase();
        match unit.trim_end_matches('s') {
            "year" => Some(DurationUnit::Years),
            "month" => Some(DurationUnit::Months),
            "day" => Some(DurationUnit::Days),
            "hour" => Some(DurationUnit::Hours),
            "minute" => Some(DurationUnit::Minutes),
            _ => None,
        }
    }
}

/// Rounds to two decimal places.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn sentinel(raw: &str) -> Option<f64> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        _ => None,
    }
}

/// Converts a duration string to fractional years.
///
/// The unbounded sentinels (`-inf`, `inf`, and their `infinity` spellings) pass through as
/// `f64::NEG_INFINITY` / `f64::INFINITY`. Every other result is rounded to two decimals.
///
/// # Errors
///
/// Returns [`MatchError::MalformedDuration`] when the input is not `<integer> <unit>` with a
/// recognised unit.
pub fn normalize_duration(raw: &str) -> MatchResult<f64> {
    if let Some(bound) = sentinel(raw) {
        return Ok(bound);
    }

    let caps = DURATION_REGEX
        .captures(raw)
        .ok_or_else(|| MatchError::MalformedDuration(raw.to_string()))?;

    let magnitude: u64 = caps[1]
        .parse()
        .map_err(|_| MatchError::MalformedDuration(raw.to_string()))?;
    let unit = DurationUnit::from_match(&caps[2])
        .ok_or_else(|| MatchError::MalformedDuration(raw.to_string()))?;

    Ok(round2(magnitude as f64 / unit.divisor()))
}

/// One side of a trial's age range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AgeBound {
    Unbounded,
    Years(f64),
}

impl AgeBound {
    /// Parses an optional registry age limit. A missing limit is unbounded.
    ///
    /// # Errors
    ///
    /// Propagates [`MatchError::MalformedDuration`] from [`normalize_duration`].
    pub fn parse(raw: Option<&str>) -> MatchResult<Self> {
        match raw {
            None => Ok(AgeBound::Unbounded),
            Some(raw) => Ok(Self::from_years(normalize_duration(raw)?)),
        }
    }

    /// Maps an infinite value onto `Unbounded`.
    pub fn from_years(years: f64) -> Self {
        if years.is_finite() {
            AgeBound::Years(years)
        } else {
            AgeBound::Unbounded
        }
    }

    pub fn years(self) -> Option<f64> {
        match self {
            AgeBound::Unbounded => None,
            AgeBound::Years(y) => Some(y),
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, AgeBound::Unbounded)
    }
}
