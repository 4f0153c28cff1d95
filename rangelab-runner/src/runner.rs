//! Simulation runner: drives one position through a loaded series.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rangelab_core::domain::PositionEpoch;
use rangelab_core::engine::{
    Degradation, Position, PositionObserver, PositionSeed, StatusSnapshot, TracingObserver,
};
use rangelab_core::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, SimulationConfig};
use crate::data_loader::{LoadError, LoadedSeries};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// One processed period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    pub timestamp: i64,
    pub tick: i32,
    pub price: f64,
    pub fee_usd: f64,
    pub in_range: bool,
    pub rebalanced: bool,
    pub active_liquidity_pct: f64,
    pub degradation: Option<Degradation>,
    pub portfolio_value_usd: f64,
}

/// Complete result of a single simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub config: SimulationConfig,
    pub dataset_hash: String,
    pub synthetic: bool,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub periods: Vec<PeriodRow>,
    pub epochs: Vec<PositionEpoch>,
    pub status: StatusSnapshot,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SimulationResult {
    pub fn rebalance_count(&self) -> usize {
        self.periods.iter().filter(|p| p.rebalanced).count()
    }

    pub fn degraded_count(&self) -> usize {
        self.periods.iter().filter(|p| p.degradation.is_some()).count()
    }
}

/// Run one simulation, logging lifecycle events through `tracing`.
pub fn run_simulation(
    config: &SimulationConfig,
    series: &LoadedSeries,
) -> Result<SimulationResult, RunError> {
    run_simulation_observed(config, series, Arc::new(TracingObserver))
}

/// Run one simulation with an explicit observer.
///
/// The position is opened against the first point. For every point the
/// rebalance check runs first; a rebalanced period is out of range for fee
/// purposes. After the last point the position is closed, flushing the final
/// epoch into the ledger.
pub fn run_simulation_observed(
    config: &SimulationConfig,
    series: &LoadedSeries,
    observer: Arc<dyn PositionObserver>,
) -> Result<SimulationResult, RunError> {
    let first = series.points.first().ok_or(LoadError::Empty)?;
    let last = series.points.last().ok_or(LoadError::Empty)?;
    let position_config = config.to_position_config()?;
    let seed = PositionSeed::from_point(first)?;
    let mut position = Position::create_observed(position_config, seed, observer)?;
    let run_id = config.run_id();
    tracing::info!(
        run_id = %run_id,
        periods = series.len(),
        width = %config.position.width,
        "starting simulation"
    );

    let rebalance = &config.rebalance;
    let mut periods = Vec::with_capacity(series.len());
    for point in &series.points {
        let tick = point.parsed_tick()?;
        let rebalanced = rebalance.enabled && position.should_rebalance(tick);
        if rebalanced {
            position.rebalance(tick, point.tvl_usd, rebalance.gas_cost_usd, false)?;
        }
        let report = position.update(point, rebalanced)?;
        periods.push(PeriodRow {
            timestamp: report.timestamp,
            tick,
            price: point.token0_price,
            fee_usd: report.fee_usd,
            in_range: report.in_range,
            rebalanced,
            active_liquidity_pct: report.active_liquidity_pct,
            degradation: report.degradation,
            portfolio_value_usd: report.portfolio_value_usd,
        });
    }

    position.close(rebalance.close_gas_cost_usd)?;
    let status = position.current_status(true);
    tracing::info!(
        run_id = %run_id,
        apr_pct = status.apr_pct,
        fees_usd = status.metrics.cumulative_fees_usd,
        rebalances = status.metrics.rebalance_count,
        degraded = status.degraded_periods,
        "simulation finished"
    );

    Ok(SimulationResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        dataset_hash: series.dataset_hash.clone(),
        synthetic: series.synthetic,
        start: first.datetime(),
        end: last.datetime(),
        periods,
        epochs: position.ledger().to_vec(),
        status,
    })
}
