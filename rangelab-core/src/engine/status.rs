//! Point-in-time status of a position, for reporting collaborators.

use serde::{Deserialize, Serialize};

use crate::engine::state::LifecycleStage;
use crate::metrics::PerformanceMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Timestamp of the last processed period, if any.
    pub timestamp: Option<i64>,
    pub stage: LifecycleStage,
    pub is_final: bool,
    pub price: f64,
    pub tick: i32,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub in_range: bool,

    pub amount0: f64,
    pub amount1: f64,
    pub asset0_share_pct: f64,
    pub liquidity: f64,
    pub pool_share_pct: f64,
    pub tvl_share_pct: f64,

    pub total_value_usd: f64,
    /// Value less the initial investment and all gas paid.
    pub pnl_usd: f64,
    pub return_pct: f64,
    /// Weighted APR in compounding mode, running APR otherwise.
    pub apr_pct: f64,
    pub hold_value_usd: f64,
    pub net_gain_vs_hold_usd: f64,
    pub initial_investment_usd: f64,
    pub current_capital_usd: f64,
    pub degraded_periods: u64,

    pub metrics: PerformanceMetrics,
    pub note: String,
}
