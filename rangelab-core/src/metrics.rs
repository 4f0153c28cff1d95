//! Performance metrics: pure functions over the accounting state and the
//! epoch ledger.
//!
//! Every function returns 0.0 on degenerate input (no periods, non-positive
//! capital) instead of NaN or infinity.

use serde::{Deserialize, Serialize};

use crate::domain::{Granularity, PositionEpoch};
use crate::engine::state::PositionState;

/// Aggregate performance figures for one position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub running_apr_pct: f64,
    pub weighted_apr_pct: f64,
    pub gross_apr_pct: f64,
    pub impermanent_loss_pct: f64,
    pub time_in_range_pct: f64,
    pub current_drawdown_pct: f64,
    pub max_drawdown_pct: f64,
    pub max_gain_pct: f64,
    pub cumulative_fees_usd: f64,
    pub total_gas_cost_usd: f64,
    pub rebalance_count: u32,
}

impl PerformanceMetrics {
    /// Compute all metrics. The epoch in progress, if it has run at least one
    /// period, is weighted alongside the closed `ledger` entries.
    pub fn compute(
        state: &PositionState,
        ledger: &[PositionEpoch],
        granularity: Granularity,
        current_price: f64,
        baseline_price: f64,
    ) -> Self {
        let ppy = granularity.periods_per_year();
        let open = state.open_epoch();
        let weighted = if open.duration_periods > 0 {
            let mut epochs = ledger.to_vec();
            epochs.push(open);
            weighted_apr(&epochs, ppy)
        } else {
            weighted_apr(ledger, ppy)
        };

        Self {
            running_apr_pct: running_apr(
                state.cumulative_fees_usd,
                state.total_gas_cost_usd,
                state.initial_investment_usd,
                ppy,
                state.total_periods,
            ),
            weighted_apr_pct: weighted,
            gross_apr_pct: gross_apr(
                state.cumulative_fees_usd,
                state.initial_investment_usd,
                ppy,
                state.total_periods,
            ),
            impermanent_loss_pct: impermanent_loss_pct(current_price, baseline_price),
            time_in_range_pct: time_in_range_pct(state.periods_in_range, state.total_periods),
            current_drawdown_pct: state.current_drawdown_pct(),
            max_drawdown_pct: state.max_drawdown_pct,
            max_gain_pct: max_gain_pct(state.max_portfolio_value, state.initial_investment_usd),
            cumulative_fees_usd: state.cumulative_fees_usd,
            total_gas_cost_usd: state.total_gas_cost_usd,
            rebalance_count: state.rebalance_count,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Net fees annualized against the original investment, in percent.
pub fn running_apr(
    cumulative_fees: f64,
    total_gas: f64,
    initial_investment: f64,
    periods_per_year: f64,
    total_periods: u64,
) -> f64 {
    if total_periods == 0 || initial_investment <= 0.0 {
        return 0.0;
    }
    (cumulative_fees - total_gas) / initial_investment * (periods_per_year / total_periods as f64)
        * 100.0
}

/// Running APR before gas.
pub fn gross_apr(
    cumulative_fees: f64,
    initial_investment: f64,
    periods_per_year: f64,
    total_periods: u64,
) -> f64 {
    running_apr(cumulative_fees, 0.0, initial_investment, periods_per_year, total_periods)
}

/// Duration-weighted mean of per-epoch APRs.
///
/// Each epoch is annualized against its own starting capital, so capital
/// compounded at rebalances is accounted for.
pub fn weighted_apr(epochs: &[PositionEpoch], periods_per_year: f64) -> f64 {
    let total_duration: u64 = epochs.iter().map(|e| e.duration_periods).sum();
    if total_duration == 0 {
        return 0.0;
    }
    let weighted_sum: f64 = epochs
        .iter()
        .map(|e| e.apr(periods_per_year) * e.duration_periods as f64)
        .sum();
    weighted_sum / total_duration as f64
}

/// Loss vs holding, in percent, at price ratio `current / baseline`.
///
/// Always `<= 0`; zero when the price is unchanged.
pub fn impermanent_loss_pct(current_price: f64, baseline_price: f64) -> f64 {
    if !(current_price > 0.0 && baseline_price > 0.0) {
        return 0.0;
    }
    let ratio = current_price / baseline_price;
    if !ratio.is_finite() {
        return 0.0;
    }
    (2.0 * ratio.sqrt() / (1.0 + ratio) - 1.0) * 100.0
}

pub fn time_in_range_pct(periods_in_range: u64, total_periods: u64) -> f64 {
    if total_periods == 0 {
        return 0.0;
    }
    (periods_in_range as f64 / total_periods as f64 * 100.0).clamp(0.0, 100.0)
}

/// Highest value reached relative to the initial investment, in percent.
pub fn max_gain_pct(max_portfolio_value: f64, initial_investment: f64) -> f64 {
    if initial_investment <= 0.0 {
        return 0.0;
    }
    ((max_portfolio_value - initial_investment) / initial_investment * 100.0).max(0.0)
}
