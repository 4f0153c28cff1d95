//! Market data point: one period of the historical feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive_price, EngineError};
use crate::math::tick::{MAX_TICK, MIN_TICK};

/// One period of pool history, as delivered by the upstream feed.
///
/// `tick` and both fee-growth counters stay decimal strings: the tick is parsed
/// on use (malformed input is fatal), the Q128 counters are parsed by the fee
/// tracker (malformed input degrades the period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataPoint {
    /// Unix seconds.
    pub timestamp: i64,
    pub tick: String,
    /// Quote price: asset0 per unit of asset1.
    pub token0_price: f64,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    pub fee_growth_global0_x128: String,
    pub fee_growth_global1_x128: String,
    pub tvl_usd: f64,
    pub liquidity: f64,
}

impl MarketDataPoint {
    pub fn parsed_tick(&self) -> Result<i32, EngineError> {
        let raw = self.tick.trim();
        let tick: i64 = raw.parse().map_err(|_| EngineError::MalformedNumber {
            field: "tick",
            value: self.tick.clone(),
        })?;
        if tick < MIN_TICK as i64 || tick > MAX_TICK as i64 {
            return Err(EngineError::TickOutOfDomain { tick });
        }
        Ok(tick as i32)
    }

    pub fn quote_price(&self) -> Result<f64, EngineError> {
        ensure_positive_price("token0_price", self.token0_price)
    }

    /// Validated `(low, high)` band, if the feed supplied both extrema.
    pub fn price_band(&self) -> Result<Option<(f64, f64)>, EngineError> {
        match (self.low, self.high) {
            (Some(low), Some(high)) => {
                let low = ensure_positive_price("low", low)?;
                let high = ensure_positive_price("high", high)?;
                Ok(Some((low.min(high), low.max(high))))
            }
            _ => Ok(None),
        }
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
