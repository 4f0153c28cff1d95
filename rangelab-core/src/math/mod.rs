//! Pool math: tick/price conversion, Q-format helpers, token allocation and
//! liquidity sizing.
//!
//! Everything here is a pure function of its arguments.

pub mod allocation;
pub mod fixed_point;
pub mod liquidity;
pub mod tick;

pub use allocation::{solve_allocation, tokens_from_liquidity};
pub use fixed_point::{u256_to_f64, Q128, Q96};
pub use liquidity::compute_liquidity;
pub use tick::{
    pool_price_at_tick, price_to_raw_tick, price_to_tick, quote_price_at_tick, tick_to_price,
    MAX_TICK, MIN_TICK, TICK_BASE,
};
