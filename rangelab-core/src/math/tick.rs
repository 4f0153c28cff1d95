//! Linear price <-> logarithmic tick conversion.
//!
//! The exchange tick indexes the raw pool price (asset1 per asset0 in base
//! units): `raw = 1.0001^tick`. The engine quotes asset1 in asset0 (human
//! units), so the forward conversion inverts the quote and applies the
//! decimal scale `10^(decimals1 - decimals0)` before taking the log.

use crate::domain::TokenPair;
use crate::error::{ensure_positive_price, EngineError};

pub const TICK_BASE: f64 = 1.0001;
pub const MIN_TICK: i32 = -887_272;
pub const MAX_TICK: i32 = 887_272;

/// Raw pool price at `tick`: `1.0001^tick`.
pub fn tick_to_price(tick: i32) -> f64 {
    TICK_BASE.powf(tick as f64)
}

/// Unrounded tick of a quote price. Used where the caller applies its own
/// rounding (range bounds floor/ceil to the tick spacing).
pub fn price_to_raw_tick(quote_price: f64, pair: TokenPair) -> Result<f64, EngineError> {
    let price = ensure_positive_price("price", quote_price)?;
    let raw_pool_price = pair.scale() / price;
    Ok(raw_pool_price.ln() / TICK_BASE.ln())
}

/// Nearest tick of a quote price. Fails fast on non-positive prices.
pub fn price_to_tick(quote_price: f64, pair: TokenPair) -> Result<i32, EngineError> {
    let tick = price_to_raw_tick(quote_price, pair)?.round();
    if tick < MIN_TICK as f64 || tick > MAX_TICK as f64 {
        return Err(EngineError::TickOutOfDomain { tick: tick as i64 });
    }
    Ok(tick as i32)
}

/// Quote price (asset0 per asset1, human units) at `tick`.
pub fn quote_price_at_tick(tick: i32, pair: TokenPair) -> f64 {
    pair.scale() / tick_to_price(tick)
}

/// Pool price (asset1 per asset0, human units) at `tick`.
pub fn pool_price_at_tick(tick: i32, pair: TokenPair) -> f64 {
    tick_to_price(tick) / pair.scale()
}
