//! Position accounting state and its reducer.
//!
//! `PositionState` is a plain value. Every change goes through
//! [`PositionState::apply`], which returns the next state plus the ledger
//! entry the event closed, if any.

use serde::{Deserialize, Serialize};

use crate::domain::PositionEpoch;

/// Where a position is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Initializing,
    Active,
    Rebalancing,
    Closed,
}

/// Inputs to the reducer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionEvent {
    /// One period was processed.
    PeriodObserved {
        fee_usd: f64,
        in_range: bool,
        degraded: bool,
        /// Mark-to-market value after this period's fee.
        portfolio_value: f64,
    },
    /// The range was re-centered. Closes the epoch and folds its fees into
    /// capital.
    Rebalanced { gas_cost_usd: f64 },
    /// Final flush. Closes the epoch without a new range.
    Closed { gas_cost_usd: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub initial_investment_usd: f64,
    /// Capital at the last allocation plus fees folded in since.
    pub current_capital_usd: f64,
    pub cumulative_fees_usd: f64,
    pub total_gas_cost_usd: f64,
    pub rebalance_count: u32,
    pub periods_in_range: u64,
    pub total_periods: u64,
    pub degraded_periods: u64,
    pub current_epoch_periods: u64,
    pub current_epoch_fees_usd: f64,
    pub current_epoch_starting_capital_usd: f64,
    pub max_portfolio_value: f64,
    /// Lowest value since the latest peak. `None` until the first peak.
    pub min_portfolio_value_after_peak: Option<f64>,
    /// Largest peak-to-trough decline seen so far, in percent.
    pub max_drawdown_pct: f64,
}

impl PositionState {
    pub fn new(initial_investment_usd: f64) -> Self {
        Self {
            initial_investment_usd,
            current_capital_usd: initial_investment_usd,
            cumulative_fees_usd: 0.0,
            total_gas_cost_usd: 0.0,
            rebalance_count: 0,
            periods_in_range: 0,
            total_periods: 0,
            degraded_periods: 0,
            current_epoch_periods: 0,
            current_epoch_fees_usd: 0.0,
            current_epoch_starting_capital_usd: initial_investment_usd,
            max_portfolio_value: initial_investment_usd,
            min_portfolio_value_after_peak: None,
            max_drawdown_pct: 0.0,
        }
    }

    pub fn apply(&self, event: &PositionEvent) -> (PositionState, Option<PositionEpoch>) {
        match *event {
            PositionEvent::PeriodObserved {
                fee_usd,
                in_range,
                degraded,
                portfolio_value,
            } => (self.observe(fee_usd, in_range, degraded, portfolio_value), None),
            PositionEvent::Rebalanced { gas_cost_usd } => {
                let (mut next, epoch) = self.close_epoch(gas_cost_usd);
                next.rebalance_count += 1;
                (next, Some(epoch))
            }
            PositionEvent::Closed { gas_cost_usd } => {
                let (next, epoch) = self.close_epoch(gas_cost_usd);
                (next, Some(epoch))
            }
        }
    }

    /// The epoch in progress, as it would be recorded if closed now.
    pub fn open_epoch(&self) -> PositionEpoch {
        PositionEpoch {
            duration_periods: self.current_epoch_periods,
            fees_earned_usd: self.current_epoch_fees_usd,
            gas_cost_usd: 0.0,
            starting_capital_usd: self.current_epoch_starting_capital_usd,
        }
    }

    /// Current peak-to-trough decline in percent. Zero before the first peak.
    pub fn current_drawdown_pct(&self) -> f64 {
        match self.min_portfolio_value_after_peak {
            Some(trough) => drawdown_pct(self.max_portfolio_value, trough),
            None => 0.0,
        }
    }

    fn observe(&self, fee_usd: f64, in_range: bool, degraded: bool, value: f64) -> Self {
        let mut next = *self;
        next.total_periods += 1;
        next.current_epoch_periods += 1;
        if in_range {
            next.periods_in_range += 1;
        }
        if degraded {
            next.degraded_periods += 1;
        }
        next.cumulative_fees_usd += fee_usd;
        next.current_epoch_fees_usd += fee_usd;

        if value > next.max_portfolio_value {
            next.max_portfolio_value = value;
            next.min_portfolio_value_after_peak = Some(value);
        } else if let Some(trough) = next.min_portfolio_value_after_peak {
            next.min_portfolio_value_after_peak = Some(trough.min(value));
        }
        next.max_drawdown_pct = next.max_drawdown_pct.max(next.current_drawdown_pct());
        next
    }

    fn close_epoch(&self, gas_cost_usd: f64) -> (Self, PositionEpoch) {
        let epoch = PositionEpoch {
            gas_cost_usd,
            ..self.open_epoch()
        };
        let mut next = *self;
        // Gas is paid from a separate balance and never reduces capital.
        next.current_capital_usd += self.current_epoch_fees_usd;
        next.total_gas_cost_usd += gas_cost_usd;
        next.current_epoch_periods = 0;
        next.current_epoch_fees_usd = 0.0;
        next.current_epoch_starting_capital_usd = next.current_capital_usd;
        (next, epoch)
    }
}

fn drawdown_pct(peak: f64, trough: f64) -> f64 {
    if peak <= 0.0 {
        return 0.0;
    }
    ((peak - trough) / peak * 100.0).max(0.0)
}
