//! Liquidity sizing in Q96 fixed point.
//!
//! Converts held asset amounts plus range bounds into the scalar liquidity
//! units the pool uses for fee sharing. Prices are pool-oriented (asset1 per
//! asset0, human units).

use crate::domain::TokenPair;
use crate::error::EngineError;
use crate::math::fixed_point::Q96;

/// `sqrt(pool_price * scale) * 2^96`.
pub fn sqrt_price_q96(pool_price: f64, scale: f64) -> f64 {
    (pool_price * scale).sqrt() * Q96
}

fn liquidity_from_amount0(raw_amount: f64, sqrt_a: f64, sqrt_b: f64) -> f64 {
    raw_amount * (sqrt_a * sqrt_b) / Q96 / (sqrt_b - sqrt_a)
}

fn liquidity_from_amount1(raw_amount: f64, sqrt_a: f64, sqrt_b: f64) -> f64 {
    raw_amount * Q96 / (sqrt_b - sqrt_a)
}

/// Liquidity units backed by `(amount0, amount1)` over the price bounds.
///
/// Inside the range the scarcer asset binds: the result is the minimum of
/// the liquidity each balance alone could support.
pub fn compute_liquidity(
    current_price: f64,
    price_lower: f64,
    price_upper: f64,
    amount0: f64,
    amount1: f64,
    pair: TokenPair,
) -> Result<f64, EngineError> {
    let scale = pair.scale();
    let s_price = sqrt_price_q96(current_price, scale);
    let a = sqrt_price_q96(price_lower, scale);
    let b = sqrt_price_q96(price_upper, scale);
    let (s_low, s_high) = (a.min(b), a.max(b));
    if !(s_high > s_low) {
        return Err(EngineError::DegenerateRange);
    }

    let raw0 = amount0 * 10f64.powi(pair.decimals0 as i32);
    let raw1 = amount1 * 10f64.powi(pair.decimals1 as i32);

    let liquidity = if s_price <= s_low {
        liquidity_from_amount0(raw0, s_low, s_high)
    } else if s_price < s_high {
        let from0 = liquidity_from_amount0(raw0, s_price, s_high);
        let from1 = liquidity_from_amount1(raw1, s_low, s_price);
        from0.min(from1)
    } else {
        liquidity_from_amount1(raw1, s_low, s_high)
    };
    Ok(liquidity)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR: TokenPair = TokenPair { decimals0: 18, decimals1: 18 };

    #[test]
    fn below_range_uses_asset0_only() {
        let l = compute_liquidity(0.5, 1.0, 4.0, 1.0, 0.0, PAIR).unwrap();
        // x * sqrt(pa) * sqrt(pb) / (sqrt(pb) - sqrt(pa)) = 1e18 * 1 * 2 / 1
        assert!((l / 2e18 - 1.0).abs() < 1e-12);
        let ignored_asset1 = compute_liquidity(0.5, 1.0, 4.0, 1.0, 50.0, PAIR).unwrap();
        assert_eq!(l, ignored_asset1);
    }

    #[test]
    fn above_range_uses_asset1_only() {
        let l = compute_liquidity(9.0, 1.0, 4.0, 0.0, 1.0, PAIR).unwrap();
        // y / (sqrt(pb) - sqrt(pa)) = 1e18 / 1
        assert!((l / 1e18 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inside_range_takes_binding_asset() {
        let balanced = compute_liquidity(2.25, 1.0, 4.0, 1.0, 1.0, PAIR).unwrap();
        let more0 = compute_liquidity(2.25, 1.0, 4.0, 10.0, 1.0, PAIR).unwrap();
        // asset1 binds: extra asset0 changes nothing once it is not scarce
        let from1_only = 1e18 / (1.5 - 1.0);
        assert!((more0 / from1_only - 1.0).abs() < 1e-12);
        assert!(more0 >= balanced);
    }

    #[test]
    fn bound_order_is_normalized() {
        let a = compute_liquidity(2.25, 1.0, 4.0, 1.0, 1.0, PAIR).unwrap();
        let b = compute_liquidity(2.25, 4.0, 1.0, 1.0, 1.0, PAIR).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn collapsed_bounds_are_rejected() {
        assert_eq!(
            compute_liquidity(1.0, 2.0, 2.0, 1.0, 1.0, PAIR),
            Err(EngineError::DegenerateRange)
        );
    }
}
