//! Engine error taxonomy.
//!
//! Every fatal condition the engine can raise is an `EngineError`. Degraded
//! fee periods are deliberately absent: they are reported on the period
//! result (see `engine::fees::Degradation`) and never abort a run.

use thiserror::Error;

/// Category of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input data at the point of use. Aborts the current run.
    DataValidation,
    /// Bad construction parameters. Raised before any period is processed.
    Configuration,
    /// Operation not allowed in the current lifecycle stage.
    Lifecycle,
    /// Internal invariant broken. Indicates a programming error.
    Invariant,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{field} must be a positive price, got {price}")]
    NonPositivePrice { field: &'static str, price: f64 },

    #[error("malformed numeric string in {field}: {value:?}")]
    MalformedNumber { field: &'static str, value: String },

    #[error("total pool liquidity must be positive, got {liquidity}")]
    NonPositiveLiquidity { liquidity: f64 },

    #[error("investment must be positive, got {amount}")]
    NonPositiveInvestment { amount: f64 },

    #[error("tick {tick} is outside the valid tick domain")]
    TickOutOfDomain { tick: i64 },

    #[error("unsupported position width specifier {spec:?}")]
    UnsupportedWidth { spec: String },

    #[error("position width must be in (0%, 200%), got {percent}%")]
    InvalidWidth { percent: f64 },

    #[error("tick spacing must be positive, got {spacing}")]
    InvalidTickSpacing { spacing: i32 },

    #[error("sentinel threshold must be at most 256 leading bits, got {bits}")]
    InvalidSentinelBits { bits: u32 },

    #[error("position is closed")]
    PositionClosed,

    #[error("range inverted after rounding: tick_lower {tick_lower} > tick_upper {tick_upper}")]
    InvertedRange { tick_lower: i32, tick_upper: i32 },

    #[error("price bounds collapse to a single point")]
    DegenerateRange,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NonPositivePrice { .. }
            | EngineError::MalformedNumber { .. }
            | EngineError::NonPositiveLiquidity { .. }
            | EngineError::NonPositiveInvestment { .. }
            | EngineError::TickOutOfDomain { .. } => ErrorKind::DataValidation,
            EngineError::UnsupportedWidth { .. }
            | EngineError::InvalidWidth { .. }
            | EngineError::InvalidTickSpacing { .. }
            | EngineError::InvalidSentinelBits { .. } => ErrorKind::Configuration,
            EngineError::PositionClosed => ErrorKind::Lifecycle,
            EngineError::InvertedRange { .. } | EngineError::DegenerateRange => {
                ErrorKind::Invariant
            }
        }
    }
}

/// Reject zero, negative, NaN and infinite prices.
pub(crate) fn ensure_positive_price(field: &'static str, price: f64) -> Result<f64, EngineError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(EngineError::NonPositivePrice { field, price })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            EngineError::NonPositivePrice { field: "price", price: 0.0 }.kind(),
            ErrorKind::DataValidation
        );
        assert_eq!(
            EngineError::UnsupportedWidth { spec: "wide".into() }.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(EngineError::PositionClosed.kind(), ErrorKind::Lifecycle);
        assert_eq!(EngineError::DegenerateRange.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn positive_price_guard() {
        assert!(ensure_positive_price("p", 1.5).is_ok());
        assert!(ensure_positive_price("p", 0.0).is_err());
        assert!(ensure_positive_price("p", -3.0).is_err());
        assert!(ensure_positive_price("p", f64::NAN).is_err());
        assert!(ensure_positive_price("p", f64::INFINITY).is_err());
    }
}
