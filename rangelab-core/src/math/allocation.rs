//! Token allocation: how much of each asset a position holds.
//!
//! Prices here are pool-oriented (asset1 per asset0, human units). The
//! decimal adjustment `decimals1 - decimals0` turns them into raw pool prices
//! before the square root. Capital is measured in asset0 terms, so the value
//! of `(amount0, amount1)` at pool price `p` is `amount0 + amount1 / p`.

use crate::domain::{TokenHoldings, TokenPair};
use crate::math::fixed_point::Q96;
use crate::math::liquidity::sqrt_price_q96;

/// Split `investment` (asset0 terms) into the holdings a fresh position over
/// `[price_lower, price_upper]` needs at `current_price`.
///
/// - below the range: everything in asset0, `amount1 == 0`
/// - above the range: everything in asset1, `amount0 == 0`
/// - inside: both amounts positive, in the ratio the range dictates
pub fn solve_allocation(
    price_lower: f64,
    price_upper: f64,
    investment: f64,
    current_price: f64,
    decimal_adjustment: i32,
) -> TokenHoldings {
    debug_assert!(current_price > 0.0, "pool price must be positive");
    let scale = 10f64.powi(decimal_adjustment);
    let (lower, upper) = if price_lower <= price_upper {
        (price_lower, price_upper)
    } else {
        (price_upper, price_lower)
    };

    let sqrt_price = (current_price * scale).sqrt();
    let sqrt_lower = (lower * scale).sqrt();
    let sqrt_upper = (upper * scale).sqrt();

    if sqrt_price <= sqrt_lower {
        return TokenHoldings::new(investment, 0.0);
    }
    if sqrt_price >= sqrt_upper {
        return TokenHoldings::new(0.0, investment * current_price);
    }

    // Per unit of delta: asset0 and asset1 needed, then priced in asset0.
    let per_delta0 = (1.0 / sqrt_price - 1.0 / sqrt_upper) * scale;
    let per_delta1 = sqrt_price - sqrt_lower;
    let delta = investment / (per_delta0 + per_delta1 / current_price);
    TokenHoldings::new(delta * per_delta0, delta * per_delta1)
}

/// Asset amounts backing `liquidity` units at `current_price` over
/// `[price_lower, price_upper]` (inverse of `compute_liquidity`).
pub fn tokens_from_liquidity(
    liquidity: f64,
    current_price: f64,
    price_lower: f64,
    price_upper: f64,
    pair: TokenPair,
) -> TokenHoldings {
    let scale = pair.scale();
    let unit0 = 10f64.powi(pair.decimals0 as i32);
    let unit1 = 10f64.powi(pair.decimals1 as i32);

    let s_price = sqrt_price_q96(current_price, scale);
    let a = sqrt_price_q96(price_lower, scale);
    let b = sqrt_price_q96(price_upper, scale);
    let (s_low, s_high) = (a.min(b), a.max(b));

    if s_price <= s_low {
        let amount0 = liquidity * Q96 * (s_high - s_low) / s_high / s_low;
        TokenHoldings::new(amount0 / unit0, 0.0)
    } else if s_price < s_high {
        let amount0 = liquidity * Q96 * (s_high - s_price) / s_high / s_price;
        let amount1 = liquidity * (s_price - s_low) / Q96;
        TokenHoldings::new(amount0 / unit0, amount1 / unit1)
    } else {
        let amount1 = liquidity * (s_high - s_low) / Q96;
        TokenHoldings::new(0.0, amount1 / unit1)
    }
}
