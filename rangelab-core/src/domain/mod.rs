//! Domain types for rangelab.

pub mod epoch;
pub mod holdings;
pub mod market;
pub mod pair;
pub mod range;

pub use epoch::PositionEpoch;
pub use holdings::TokenHoldings;
pub use market::MarketDataPoint;
pub use pair::{Granularity, TokenPair};
pub use range::{PositionRange, WidthSpec};
