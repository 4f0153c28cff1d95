//! RangeLab Core: concentrated-liquidity position simulation and accounting.
//!
//! This crate contains the engine:
//! - Domain types (market data points, ranges, holdings, epochs, token pairs)
//! - Tick/price conversion and Q96/Q128 fixed-point helpers
//! - Token allocation and liquidity sizing
//! - Fee accrual from fee-growth counters with degraded-period handling
//! - Position lifecycle state machine with an epoch ledger
//! - Performance metrics (running/weighted/gross APR, IL, time in range, drawdown)
//!
//! Everything is synchronous and free of I/O. Logging goes through the
//! injected [`engine::PositionObserver`].

pub mod domain;
pub mod engine;
pub mod error;
pub mod math;
pub mod metrics;

pub use error::{EngineError, ErrorKind};
