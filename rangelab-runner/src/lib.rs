//! RangeLab Runner: simulation orchestration around `rangelab-core`.
//!
//! This crate provides:
//! - TOML configuration with content-addressed run ids
//! - CSV series loading with ordering checks and dataset hashing
//! - Deterministic synthetic series
//! - The per-period driver loop with the rebalance policy
//! - Parallel parameter sweeps over width and cooldown

pub mod config;
pub mod data_loader;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{ConfigError, RunId, SimulationConfig};
pub use data_loader::{load_series, read_series, LoadError, LoadedSeries};
pub use runner::{
    run_simulation, run_simulation_observed, PeriodRow, RunError, SimulationResult,
    SCHEMA_VERSION,
};
pub use sweep::{ParamSweep, SweepGrid, SweepResults, SweepSummary};
pub use synthetic::{generate_series, SyntheticSpec};
