//! Deterministic synthetic series for demos, tests, and benchmarks.
//!
//! Produces a random walk in tick space with consistent prices, a high/low
//! band around each price, and fee-growth counters that only increase.
//! The same parameters always yield the same series.

use primitive_types::U256;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rangelab_core::domain::{MarketDataPoint, TokenPair};
use rangelab_core::math::{price_to_tick, quote_price_at_tick, MAX_TICK, MIN_TICK};
use rangelab_core::EngineError;

/// Parameters of a synthetic series.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub periods: usize,
    pub seed: u64,
    pub pair: TokenPair,
    /// Quote price of the first point.
    pub start_price: f64,
    /// Largest tick move between consecutive points.
    pub max_tick_step: i32,
    pub start_timestamp: i64,
    pub period_seconds: i64,
    /// Upper bound of the per-period fee-growth increment, per asset.
    pub max_fee_growth_step: u128,
    pub tvl_usd: f64,
    pub pool_liquidity: f64,
}

impl SyntheticSpec {
    /// Hourly BTC-like series quoted in a 6-decimal stablecoin.
    pub fn new(periods: usize, seed: u64, pair: TokenPair) -> Self {
        Self {
            periods,
            seed,
            pair,
            start_price: 100_000.0,
            max_tick_step: 60,
            start_timestamp: 1_700_000_000,
            period_seconds: 3_600,
            max_fee_growth_step: 1u128 << 110,
            tvl_usd: 25_000_000.0,
            pool_liquidity: 5e18,
        }
    }

    pub fn with_start_price(mut self, price: f64) -> Self {
        self.start_price = price;
        self
    }
}

/// Generate the series described by `spec`.
pub fn generate_series(spec: &SyntheticSpec) -> Result<Vec<MarketDataPoint>, EngineError> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut tick = price_to_tick(spec.start_price, spec.pair)?;
    let mut growth0 = U256::zero();
    let mut growth1 = U256::zero();
    let step = spec.max_tick_step.max(1);
    let max_growth = spec.max_fee_growth_step.max(1);

    let mut points = Vec::with_capacity(spec.periods);
    for i in 0..spec.periods {
        if i > 0 {
            tick = (tick + rng.gen_range(-step..=step)).clamp(MIN_TICK, MAX_TICK);
            growth0 += U256::from(rng.gen_range(0..max_growth));
            growth1 += U256::from(rng.gen_range(0..max_growth));
        }
        let price = quote_price_at_tick(tick, spec.pair);
        let spread: f64 = rng.gen_range(0.001..0.01);
        let tvl_noise: f64 = rng.gen_range(-0.02..0.02);
        let liquidity_noise: f64 = rng.gen_range(-0.02..0.02);

        points.push(MarketDataPoint {
            timestamp: spec.start_timestamp + i as i64 * spec.period_seconds,
            tick: tick.to_string(),
            token0_price: price,
            low: Some(price * (1.0 - spread)),
            high: Some(price * (1.0 + spread)),
            fee_growth_global0_x128: growth0.to_string(),
            fee_growth_global1_x128: growth1.to_string(),
            tvl_usd: spec.tvl_usd * (1.0 + tvl_noise),
            liquidity: spec.pool_liquidity * (1.0 + liquidity_noise),
        });
    }
    Ok(points)
}
