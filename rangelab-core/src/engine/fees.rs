//! Fee accrual from cumulative fee-growth counters.
//!
//! The pool exposes two Q128 counters (fees per unit of liquidity, one per
//! asset) that only ever grow. A position's fee for one period is the growth
//! since the previous snapshot times its liquidity. Deltas are taken on the
//! 256-bit integers; floating point only enters after subtraction.
//!
//! Bad counter values never abort a run. They produce a zero fee and a
//! [`Degradation`] on the period report.

use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::domain::{PositionRange, TokenPair};
use crate::error::EngineError;
use crate::math::fixed_point::{leading_ones, parse_u256, u256_to_f64, Q128};
use crate::math::tick::price_to_raw_tick;

/// Default number of leading one bits that marks an uninitialized counter.
pub const DEFAULT_SENTINEL_BITS: u32 = 16;

/// One pair of cumulative fee-growth counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeGrowthSnapshot {
    pub fee_growth0: U256,
    pub fee_growth1: U256,
}

impl FeeGrowthSnapshot {
    pub fn new(fee_growth0: U256, fee_growth1: U256) -> Self {
        Self {
            fee_growth0,
            fee_growth1,
        }
    }

    /// Parse the feed's decimal strings. `None` if either is malformed.
    pub fn parse(fee_growth0: &str, fee_growth1: &str) -> Option<Self> {
        Some(Self::new(parse_u256(fee_growth0)?, parse_u256(fee_growth1)?))
    }
}

/// Heuristic for counters that were never initialized upstream.
///
/// Such values sit just below `2^256` or just below `2^128`, depending on
/// the width the source stored them in. A value whose top `bits` bits are
/// all set, at either width, is treated as a sentinel. Zero bits disables
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelPolicy {
    bits: u32,
}

impl SentinelPolicy {
    pub fn new(bits: u32) -> Result<Self, EngineError> {
        if bits > 256 {
            return Err(EngineError::InvalidSentinelBits { bits });
        }
        Ok(Self { bits })
    }

    pub fn disabled() -> Self {
        Self { bits: 0 }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn is_sentinel(&self, value: U256) -> bool {
        if self.bits == 0 {
            return false;
        }
        let wide = leading_ones(self.bits);
        let narrow = wide >> 128;
        value >= wide || (value >= narrow && value <= U256::from(u128::MAX))
    }

    fn flags(&self, snapshot: &FeeGrowthSnapshot) -> bool {
        self.is_sentinel(snapshot.fee_growth0) || self.is_sentinel(snapshot.fee_growth1)
    }
}

impl Default for SentinelPolicy {
    fn default() -> Self {
        Self {
            bits: DEFAULT_SENTINEL_BITS,
        }
    }
}

/// Why a period's fee was forced to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    /// A counter was not a decimal integer.
    Malformed,
    /// A counter matched the uninitialized-value heuristic.
    Sentinel,
    /// A counter went backwards.
    Decreasing,
    /// The fee came out NaN or infinite.
    NonFinite,
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Degradation::Malformed => "malformed fee-growth value",
            Degradation::Sentinel => "uninitialized fee-growth sentinel",
            Degradation::Decreasing => "fee-growth counter decreased",
            Degradation::NonFinite => "non-finite fee",
        };
        f.write_str(text)
    }
}

/// Fee for one period: `(fee_usd, degradation)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeeAccrual {
    pub fee_usd: f64,
    pub degradation: Option<Degradation>,
}

impl FeeAccrual {
    fn degraded(reason: Degradation) -> Self {
        Self {
            fee_usd: 0.0,
            degradation: Some(reason),
        }
    }
}

fn growth_delta(previous: U256, current: U256, decimals: u8) -> Option<f64> {
    let delta = current.checked_sub(previous)?;
    Some(u256_to_f64(delta) / Q128 / 10f64.powi(decimals as i32))
}

/// USD fee earned between two snapshots.
///
/// `active_fraction_pct` is in `[0, 100]`. `quote_price` converts asset1 fees
/// to asset0 (USD). With no previous snapshot the fee is zero.
pub fn accrue(
    previous: Option<&FeeGrowthSnapshot>,
    current: &FeeGrowthSnapshot,
    liquidity: f64,
    active_fraction_pct: f64,
    pair: TokenPair,
    quote_price: f64,
) -> Result<f64, Degradation> {
    let Some(previous) = previous else {
        return Ok(0.0);
    };
    let delta0 = growth_delta(previous.fee_growth0, current.fee_growth0, pair.decimals0)
        .ok_or(Degradation::Decreasing)?;
    let delta1 = growth_delta(previous.fee_growth1, current.fee_growth1, pair.decimals1)
        .ok_or(Degradation::Decreasing)?;

    let share = liquidity * active_fraction_pct / 100.0;
    let fee = delta0 * share + delta1 * share * quote_price;
    if fee.is_finite() {
        Ok(fee)
    } else {
        Err(Degradation::NonFinite)
    }
}

/// Holds the reference snapshot between periods.
#[derive(Debug, Clone)]
pub struct FeeAccrualTracker {
    reference: Option<FeeGrowthSnapshot>,
    policy: SentinelPolicy,
    pair: TokenPair,
}

impl FeeAccrualTracker {
    pub fn new(pair: TokenPair, policy: SentinelPolicy) -> Self {
        Self {
            reference: None,
            policy,
            pair,
        }
    }

    pub fn reference(&self) -> Option<&FeeGrowthSnapshot> {
        self.reference.as_ref()
    }

    /// Record this period's counters and, when `collect` is set, return the
    /// fee earned since the last valid snapshot.
    ///
    /// Malformed and sentinel counters leave the reference untouched. A
    /// decreasing counter replaces it, since the feed has clearly reset.
    pub fn advance(
        &mut self,
        fee_growth0: &str,
        fee_growth1: &str,
        liquidity: f64,
        active_fraction_pct: f64,
        quote_price: f64,
        collect: bool,
    ) -> FeeAccrual {
        let Some(current) = FeeGrowthSnapshot::parse(fee_growth0, fee_growth1) else {
            return FeeAccrual::degraded(Degradation::Malformed);
        };
        if self.policy.flags(&current) {
            return FeeAccrual::degraded(Degradation::Sentinel);
        }

        let previous = self.reference.replace(current);
        let result = accrue(
            previous.as_ref(),
            &current,
            liquidity,
            active_fraction_pct,
            self.pair,
            quote_price,
        );
        match result {
            Ok(fee) if collect => FeeAccrual {
                fee_usd: fee,
                degradation: None,
            },
            Ok(_) => FeeAccrual::default(),
            Err(reason) => FeeAccrual::degraded(reason),
        }
    }
}

/// Share of the period's activity (percent) that fell inside the range.
///
/// Full-range positions always earn on 100%. With an observed `(low, high)`
/// quote band the result is the tick overlap between band and range over the
/// band's tick width. Without a band the current tick decides all or nothing.
pub fn active_liquidity_fraction(
    range: &PositionRange,
    tick: i32,
    band: Option<(f64, f64)>,
    pair: TokenPair,
) -> Result<f64, EngineError> {
    if range.is_full_range() {
        return Ok(100.0);
    }
    let Some((low, high)) = band else {
        return Ok(if range.contains_tick(tick) { 100.0 } else { 0.0 });
    };

    // Quote prices invert: the high print is the lower tick.
    let band_lower = price_to_raw_tick(high, pair)?;
    let band_upper = price_to_raw_tick(low, pair)?;
    let range_lower = range.tick_lower as f64;
    let range_upper = range.tick_upper as f64;

    let band_width = band_upper - band_lower;
    if band_width <= 0.0 {
        let inside = band_lower >= range_lower && band_lower <= range_upper;
        return Ok(if inside { 100.0 } else { 0.0 });
    }
    let overlap = (band_upper.min(range_upper) - band_lower.max(range_lower)).max(0.0);
    Ok((overlap / band_width * 100.0).clamp(0.0, 100.0))
}
