use serde::{Deserialize, Serialize};

/// Asset quantities held by the position, in each asset's human unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenHoldings {
    pub amount0: f64,
    pub amount1: f64,
}

impl TokenHoldings {
    pub fn new(amount0: f64, amount1: f64) -> Self {
        Self { amount0, amount1 }
    }

    /// Value in asset0 (USD) terms at quote price `P` (asset0 per asset1).
    pub fn value_at(&self, quote_price: f64) -> f64 {
        self.amount0 + self.amount1 * quote_price
    }

    /// Share of the value held in asset0, in percent. Zero when empty.
    pub fn asset0_share_pct(&self, quote_price: f64) -> f64 {
        let total = self.value_at(quote_price);
        if total <= 0.0 {
            return 0.0;
        }
        self.amount0 / total * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_uses_asset0_numeraire() {
        let h = TokenHoldings::new(500.0, 0.005);
        assert!((h.value_at(100_000.0) - 1_000.0).abs() < 1e-9);
        assert!((h.asset0_share_pct(100_000.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_holdings_share_is_zero() {
        assert_eq!(TokenHoldings::default().asset0_share_pct(10.0), 0.0);
    }
}
