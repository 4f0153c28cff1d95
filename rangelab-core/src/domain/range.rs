//! Position range and width specifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// How wide a position should be around its reference price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WidthSpec {
    /// The whole legal tick domain, price bounds `[0, +inf)`.
    FullRange,
    /// Total band width in percent: `w` covers `[P(1 - w/2), P(1 + w/2)]`.
    Percent(f64),
}

impl WidthSpec {
    /// Percentage width, validated to keep the lower band edge positive.
    pub fn percent(percent: f64) -> Result<Self, EngineError> {
        if !percent.is_finite() || percent <= 0.0 || percent >= 200.0 {
            return Err(EngineError::InvalidWidth { percent });
        }
        Ok(WidthSpec::Percent(percent))
    }

    /// Band width as a fraction (`0.10` for 10%), `None` for full range.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            WidthSpec::FullRange => None,
            WidthSpec::Percent(p) => Some(p / 100.0),
        }
    }
}

impl FromStr for WidthSpec {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if matches!(lowered.as_str(), "full" | "full-range" | "full_range" | "fullrange") {
            return Ok(WidthSpec::FullRange);
        }
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let percent: f64 = number.parse().map_err(|_| EngineError::UnsupportedWidth {
            spec: s.to_string(),
        })?;
        WidthSpec::percent(percent)
    }
}

impl TryFrom<String> for WidthSpec {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WidthSpec> for String {
    fn from(value: WidthSpec) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WidthSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidthSpec::FullRange => write!(f, "full"),
            WidthSpec::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// Inclusive tick bounds and the matching quote-price bounds.
///
/// Ticks are in exchange orientation, prices in quote orientation, so
/// `price_lower` corresponds to `tick_upper` and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRange {
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub price_lower: f64,
    pub price_upper: f64,
    /// Requested band width as a fraction, `None` for full range.
    pub range_width_fraction: Option<f64>,
}

impl PositionRange {
    pub fn is_full_range(&self) -> bool {
        self.range_width_fraction.is_none()
    }

    pub fn contains_tick(&self, tick: i32) -> bool {
        tick >= self.tick_lower && tick <= self.tick_upper
    }

    /// Tick distance between the bounds.
    pub fn tick_width(&self) -> i64 {
        self.tick_upper as i64 - self.tick_lower as i64
    }
}
