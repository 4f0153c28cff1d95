//! Parameter sweeps over width and rebalance cooldown.
//!
//! Every grid cell is an independent position over the same series, so the
//! cells run in parallel with no shared state.

use std::collections::HashMap;

use rangelab_core::domain::WidthSpec;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::data_loader::LoadedSeries;
use crate::runner::{run_simulation, RunError, SimulationResult};

/// Grid of strategy parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub widths: Vec<WidthSpec>,
    pub cooldowns: Vec<u64>,
}

impl SweepGrid {
    pub fn new(widths: Vec<WidthSpec>, cooldowns: Vec<u64>) -> Self {
        Self { widths, cooldowns }
    }

    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.widths.len() * self.cooldowns.len()
    }

    /// Generates all configurations in the grid, widths outermost.
    pub fn generate_configs(&self, base: &SimulationConfig) -> Vec<SimulationConfig> {
        self.widths
            .iter()
            .flat_map(|&width| {
                self.cooldowns
                    .iter()
                    .map(move |&cooldown| base.with_strategy(width, cooldown))
            })
            .collect()
    }
}

/// Parameter sweep executor.
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every grid cell against `series`. Results keep grid order.
    pub fn sweep(
        &self,
        grid: &SweepGrid,
        base: &SimulationConfig,
        series: &LoadedSeries,
    ) -> Result<SweepResults, RunError> {
        let configs = grid.generate_configs(base);
        tracing::info!(cells = configs.len(), parallel = self.parallel, "starting sweep");

        let results: Vec<SimulationResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| run_simulation(config, series))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            configs
                .iter()
                .map(|config| run_simulation(config, series))
                .collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults::new(results))
    }
}

/// One line of a sweep leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub run_id: String,
    pub width: WidthSpec,
    pub cooldown_periods: u64,
    pub apr_pct: f64,
    pub running_apr_pct: f64,
    pub weighted_apr_pct: f64,
    pub fees_usd: f64,
    pub gas_usd: f64,
    pub rebalance_count: u32,
    pub time_in_range_pct: f64,
    pub max_drawdown_pct: f64,
    pub net_gain_vs_hold_usd: f64,
}

impl SweepSummary {
    fn from_result(result: &SimulationResult) -> Self {
        let metrics = &result.status.metrics;
        Self {
            run_id: result.run_id.clone(),
            width: result.config.position.width,
            cooldown_periods: result.config.rebalance.cooldown_periods,
            apr_pct: result.status.apr_pct,
            running_apr_pct: metrics.running_apr_pct,
            weighted_apr_pct: metrics.weighted_apr_pct,
            fees_usd: metrics.cumulative_fees_usd,
            gas_usd: metrics.total_gas_cost_usd,
            rebalance_count: metrics.rebalance_count,
            time_in_range_pct: metrics.time_in_range_pct,
            max_drawdown_pct: metrics.max_drawdown_pct,
            net_gain_vs_hold_usd: result.status.net_gain_vs_hold_usd,
        }
    }
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    results: Vec<SimulationResult>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(results: Vec<SimulationResult>) -> Self {
        let by_run_id = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { results, by_run_id }
    }

    /// Returns all results in grid order.
    pub fn all(&self) -> &[SimulationResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&SimulationResult> {
        self.by_run_id.get(run_id).map(|&i| &self.results[i])
    }

    /// Results sorted by headline APR (net of gas), best first.
    pub fn sorted_by_apr(&self) -> Vec<&SimulationResult> {
        let mut sorted: Vec<&SimulationResult> = self.results.iter().collect();
        sorted.sort_by(|a, b| b.status.apr_pct.total_cmp(&a.status.apr_pct));
        sorted
    }

    /// Leaderboard rows, best APR first.
    pub fn summaries(&self) -> Vec<SweepSummary> {
        self.sorted_by_apr()
            .into_iter()
            .map(SweepSummary::from_result)
            .collect()
    }
}
