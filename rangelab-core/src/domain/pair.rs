use serde::{Deserialize, Serialize};

/// Decimal places of the two pool assets.
///
/// Asset0 is the valuation numeraire (USD-like). Asset1 is priced in asset0
/// through the quote price `token0Price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub decimals0: u8,
    pub decimals1: u8,
}

impl TokenPair {
    pub fn new(decimals0: u8, decimals1: u8) -> Self {
        Self { decimals0, decimals1 }
    }

    /// `decimals1 - decimals0`, the exponent between human and raw pool prices.
    pub fn decimal_adjustment(&self) -> i32 {
        self.decimals1 as i32 - self.decimals0 as i32
    }

    /// `10^(decimals1 - decimals0)`.
    pub fn scale(&self) -> f64 {
        10f64.powi(self.decimal_adjustment())
    }
}

/// Length of one simulated period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Hourly,
}

impl Granularity {
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Granularity::Daily => 365.0,
            Granularity::Hourly => 8760.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usdc_wbtc_adjustment() {
        let pair = TokenPair::new(6, 8);
        assert_eq!(pair.decimal_adjustment(), 2);
        assert!((pair.scale() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn negative_adjustment() {
        let pair = TokenPair::new(18, 6);
        assert_eq!(pair.decimal_adjustment(), -12);
        assert!((pair.scale() - 1e-12).abs() < 1e-24);
    }

    #[test]
    fn periods_per_year() {
        assert_eq!(Granularity::Daily.periods_per_year(), 365.0);
        assert_eq!(Granularity::Hourly.periods_per_year(), 8760.0);
    }

    #[test]
    fn granularity_serde_lowercase() {
        let json = serde_json::to_string(&Granularity::Hourly).unwrap();
        assert_eq!(json, "\"hourly\"");
    }
}
