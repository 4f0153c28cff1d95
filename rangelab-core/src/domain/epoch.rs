use serde::{Deserialize, Serialize};

/// One active range episode, appended to the ledger when the range is
/// replaced or the position is closed. Never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionEpoch {
    pub duration_periods: u64,
    pub fees_earned_usd: f64,
    pub gas_cost_usd: f64,
    pub starting_capital_usd: f64,
}

impl PositionEpoch {
    pub fn net_fees_usd(&self) -> f64 {
        self.fees_earned_usd - self.gas_cost_usd
    }

    /// Annualized return of this epoch on its own starting capital, in percent.
    ///
    /// Zero-length epochs and epochs without capital contribute 0.
    pub fn apr(&self, periods_per_year: f64) -> f64 {
        if self.duration_periods == 0 || self.starting_capital_usd <= 0.0 {
            return 0.0;
        }
        self.net_fees_usd() / self.starting_capital_usd
            * (periods_per_year / self.duration_periods as f64)
            * 100.0
    }
}
