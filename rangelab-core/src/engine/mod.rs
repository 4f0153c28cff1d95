//! Position engine: range allocation, fee accrual, lifecycle and status.
//!
//! The engine consumes one `MarketDataPoint` per period, strictly in time
//! order:
//!
//! 1. Rebalance check: out-of-range tick and cooldown elapsed
//! 2. Fee accrual against the previous fee-growth snapshot
//! 3. Mark-to-market and drawdown tracking
//! 4. Epoch ledger updates on rebalance and close

pub mod fees;
pub mod observer;
pub mod position;
pub mod range;
pub mod state;
pub mod status;

pub use fees::{
    accrue, active_liquidity_fraction, Degradation, FeeAccrual, FeeAccrualTracker,
    FeeGrowthSnapshot, SentinelPolicy, DEFAULT_SENTINEL_BITS,
};
pub use observer::{NullObserver, PositionObserver, TracingObserver};
pub use position::{PeriodReport, Position, PositionConfig, PositionSeed};
pub use range::{compute_range, usable_tick_bounds};
pub use state::{LifecycleStage, PositionEvent, PositionState};
pub use status::StatusSnapshot;
