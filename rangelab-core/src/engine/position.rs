//! Position lifecycle controller.
//!
//! One `Position` simulates one liquidity position over an ordered series of
//! market data points:
//!
//! 1. `create` allocates the first range and holdings (Initializing → Active)
//! 2. `update` accrues one period of fees and marks the position to market
//! 3. `rebalance` closes the epoch and re-centers the range (Active →
//!    Rebalancing → Active)
//! 4. `close` flushes the final epoch (→ Closed); later calls fail
//!
//! Periods must arrive in increasing timestamp order. Fee deltas are taken
//! against the immediately preceding snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{
    Granularity, MarketDataPoint, PositionEpoch, PositionRange, TokenHoldings, TokenPair,
    WidthSpec,
};
use crate::engine::fees::{
    active_liquidity_fraction, Degradation, FeeAccrualTracker, SentinelPolicy,
};
use crate::engine::observer::{NullObserver, PositionObserver};
use crate::engine::range::compute_range;
use crate::engine::state::{LifecycleStage, PositionEvent, PositionState};
use crate::engine::status::StatusSnapshot;
use crate::error::{ensure_positive_price, EngineError};
use crate::math::allocation::{solve_allocation, tokens_from_liquidity};
use crate::math::liquidity::compute_liquidity;
use crate::math::tick::{pool_price_at_tick, quote_price_at_tick, MAX_TICK, MIN_TICK};
use crate::metrics::PerformanceMetrics;

/// Static parameters of a simulated position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionConfig {
    pub initial_investment: f64,
    pub width: WidthSpec,
    pub tick_spacing: i32,
    pub pair: TokenPair,
    pub granularity: Granularity,
    /// Report the weighted APR as the headline APR.
    pub use_compounding_apr: bool,
    /// Periods that must pass in an epoch before an out-of-range tick
    /// triggers a rebalance.
    pub cooldown_periods: u64,
    pub sentinel: SentinelPolicy,
}

impl PositionConfig {
    pub fn new(
        initial_investment: f64,
        width: WidthSpec,
        tick_spacing: i32,
        pair: TokenPair,
        granularity: Granularity,
    ) -> Self {
        Self {
            initial_investment,
            width,
            tick_spacing,
            pair,
            granularity,
            use_compounding_apr: false,
            cooldown_periods: 1,
            sentinel: SentinelPolicy::default(),
        }
    }

    pub fn with_compounding_apr(mut self, enabled: bool) -> Self {
        self.use_compounding_apr = enabled;
        self
    }

    pub fn with_cooldown(mut self, periods: u64) -> Self {
        self.cooldown_periods = periods;
        self
    }

    pub fn with_sentinel(mut self, sentinel: SentinelPolicy) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(EngineError::NonPositiveInvestment {
                amount: self.initial_investment,
            });
        }
        if self.tick_spacing <= 0 || self.tick_spacing > MAX_TICK {
            return Err(EngineError::InvalidTickSpacing {
                spacing: self.tick_spacing,
            });
        }
        if let WidthSpec::Percent(p) = self.width {
            WidthSpec::percent(p)?;
        }
        Ok(())
    }
}

/// Market state the position is opened against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSeed {
    pub reference_tick: i32,
    pub reference_tvl_usd: f64,
    /// Quote price (asset0 per asset1).
    pub reference_price: f64,
    pub total_pool_liquidity: f64,
}

impl PositionSeed {
    /// Seed from a feed point.
    pub fn from_point(point: &MarketDataPoint) -> Result<Self, EngineError> {
        Ok(Self {
            reference_tick: point.parsed_tick()?,
            reference_tvl_usd: point.tvl_usd,
            reference_price: point.quote_price()?,
            total_pool_liquidity: point.liquidity,
        })
    }
}

/// Result of one `update` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub timestamp: i64,
    pub fee_usd: f64,
    pub in_range: bool,
    pub active_liquidity_pct: f64,
    pub degradation: Option<Degradation>,
    pub portfolio_value_usd: f64,
}

/// Holdings and liquidity established by one allocation.
#[derive(Debug, Clone, Copy)]
struct Allocation {
    range: PositionRange,
    holdings: TokenHoldings,
    liquidity: f64,
}

fn allocate(
    config: &PositionConfig,
    range: PositionRange,
    capital: f64,
    quote_price: f64,
) -> Result<Allocation, EngineError> {
    let pair = config.pair;
    let pool_price = 1.0 / quote_price;
    let pool_lower = pool_price_at_tick(range.tick_lower, pair);
    let pool_upper = pool_price_at_tick(range.tick_upper, pair);
    let holdings = solve_allocation(
        pool_lower,
        pool_upper,
        capital,
        pool_price,
        pair.decimal_adjustment(),
    );
    let liquidity = compute_liquidity(
        pool_price,
        pool_lower,
        pool_upper,
        holdings.amount0,
        holdings.amount1,
        pair,
    )?;
    Ok(Allocation {
        range,
        holdings,
        liquidity,
    })
}

pub struct Position {
    config: PositionConfig,
    stage: LifecycleStage,
    state: PositionState,
    ledger: Vec<PositionEpoch>,
    range: PositionRange,
    /// Holdings at the last allocation; the hold baseline.
    initial_holdings: TokenHoldings,
    liquidity: f64,
    /// Capital deployed at the last allocation.
    allocated_capital_usd: f64,
    baseline_price: f64,
    fees: FeeAccrualTracker,
    total_pool_liquidity: f64,
    current_tvl_usd: f64,
    current_price: f64,
    current_tick: i32,
    last_timestamp: Option<i64>,
    observer: Arc<dyn PositionObserver>,
}

impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Position")
            .field("stage", &self.stage)
            .field("range", &self.range)
            .field("liquidity", &self.liquidity)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Position {
    /// Open a position with no observer.
    pub fn create(config: PositionConfig, seed: PositionSeed) -> Result<Self, EngineError> {
        Self::create_observed(config, seed, Arc::new(NullObserver))
    }

    pub fn create_observed(
        config: PositionConfig,
        seed: PositionSeed,
        observer: Arc<dyn PositionObserver>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let price = ensure_positive_price("reference_price", seed.reference_price)?;
        if !(seed.total_pool_liquidity > 0.0) {
            return Err(EngineError::NonPositiveLiquidity {
                liquidity: seed.total_pool_liquidity,
            });
        }

        let range = compute_range(
            seed.reference_tick,
            config.width,
            config.tick_spacing,
            config.pair,
        )?;
        let allocation = allocate(&config, range, config.initial_investment, price)?;
        let position = Self {
            stage: LifecycleStage::Initializing,
            state: PositionState::new(config.initial_investment),
            ledger: Vec::new(),
            range: allocation.range,
            initial_holdings: allocation.holdings,
            liquidity: allocation.liquidity,
            allocated_capital_usd: config.initial_investment,
            baseline_price: price,
            fees: FeeAccrualTracker::new(config.pair, config.sentinel),
            total_pool_liquidity: seed.total_pool_liquidity,
            current_tvl_usd: seed.reference_tvl_usd,
            current_price: price,
            current_tick: seed.reference_tick,
            last_timestamp: None,
            observer,
            config,
        };
        Ok(position.enter(LifecycleStage::Active))
    }

    fn enter(mut self, stage: LifecycleStage) -> Self {
        self.transition(stage);
        self
    }

    fn transition(&mut self, stage: LifecycleStage) {
        let from = std::mem::replace(&mut self.stage, stage);
        self.observer.on_stage_change(from, stage);
    }

    fn ensure_open(&self) -> Result<(), EngineError> {
        if self.stage == LifecycleStage::Closed {
            return Err(EngineError::PositionClosed);
        }
        Ok(())
    }

    /// Process one period.
    ///
    /// A period flagged `was_rebalanced` is out of range for fee purposes,
    /// since the range changed mid-period. The fee-growth snapshot is
    /// recorded either way.
    pub fn update(
        &mut self,
        point: &MarketDataPoint,
        was_rebalanced: bool,
    ) -> Result<PeriodReport, EngineError> {
        self.ensure_open()?;
        let tick = point.parsed_tick()?;
        let price = point.quote_price()?;
        let band = point.price_band()?;
        if !(point.liquidity > 0.0) {
            return Err(EngineError::NonPositiveLiquidity {
                liquidity: point.liquidity,
            });
        }

        let in_range = !was_rebalanced && self.range.contains_tick(tick);
        let active_pct = if in_range {
            active_liquidity_fraction(&self.range, tick, band, self.config.pair)?
        } else {
            0.0
        };
        let accrual = self.fees.advance(
            &point.fee_growth_global0_x128,
            &point.fee_growth_global1_x128,
            self.liquidity,
            active_pct,
            price,
            in_range,
        );
        if let Some(reason) = accrual.degradation {
            self.observer.on_degraded_period(point.timestamp, reason);
        }

        self.total_pool_liquidity = point.liquidity;
        self.current_tvl_usd = point.tvl_usd;
        self.current_price = price;
        self.current_tick = tick;
        self.last_timestamp = Some(point.timestamp);

        let portfolio_value =
            self.lp_value(price) + self.unreinvested_fees() + accrual.fee_usd;
        let (state, _) = self.state.apply(&PositionEvent::PeriodObserved {
            fee_usd: accrual.fee_usd,
            in_range,
            degraded: accrual.degradation.is_some(),
            portfolio_value,
        });
        self.state = state;

        Ok(PeriodReport {
            timestamp: point.timestamp,
            fee_usd: accrual.fee_usd,
            in_range,
            active_liquidity_pct: active_pct,
            degradation: accrual.degradation,
            portfolio_value_usd: portfolio_value,
        })
    }

    /// True when `tick` is outside the range and the current epoch has
    /// lasted at least the cooldown.
    pub fn should_rebalance(&self, tick: i32) -> bool {
        self.stage == LifecycleStage::Active
            && !self.range.contains_tick(tick)
            && self.state.current_epoch_periods >= self.config.cooldown_periods
    }

    /// Close the current epoch and re-center around `current_tick`.
    ///
    /// With `is_closing` set this only flushes the epoch, like [`close`].
    /// Fees earned so far are folded into capital and redeployed at the quote
    /// price of `current_tick`, which also becomes the impermanent-loss
    /// baseline. On error the position is left unchanged.
    ///
    /// [`close`]: Position::close
    pub fn rebalance(
        &mut self,
        current_tick: i32,
        current_tvl_usd: f64,
        gas_cost_usd: f64,
        is_closing: bool,
    ) -> Result<(), EngineError> {
        self.ensure_open()?;
        if is_closing {
            return self.close(gas_cost_usd);
        }
        if !(MIN_TICK..=MAX_TICK).contains(&current_tick) {
            return Err(EngineError::TickOutOfDomain {
                tick: current_tick as i64,
            });
        }

        let (next_state, epoch) = self.state.apply(&PositionEvent::Rebalanced { gas_cost_usd });
        let price = quote_price_at_tick(current_tick, self.config.pair);
        let range = compute_range(
            current_tick,
            self.config.width,
            self.config.tick_spacing,
            self.config.pair,
        )?;
        let allocation = allocate(&self.config, range, next_state.current_capital_usd, price)?;

        self.transition(LifecycleStage::Rebalancing);
        self.state = next_state;
        if let Some(epoch) = epoch {
            self.ledger.push(epoch);
        }
        self.range = allocation.range;
        self.initial_holdings = allocation.holdings;
        self.liquidity = allocation.liquidity;
        self.allocated_capital_usd = next_state.current_capital_usd;
        self.baseline_price = price;
        self.current_price = price;
        self.current_tick = current_tick;
        self.current_tvl_usd = current_tvl_usd;
        if let Some(epoch) = self.ledger.last() {
            self.observer.on_rebalance(epoch, &self.range);
        }
        self.transition(LifecycleStage::Active);
        Ok(())
    }

    /// Flush the final epoch into the ledger. No updates are accepted after.
    pub fn close(&mut self, gas_cost_usd: f64) -> Result<(), EngineError> {
        self.ensure_open()?;
        let (state, epoch) = self.state.apply(&PositionEvent::Closed { gas_cost_usd });
        self.state = state;
        if let Some(epoch) = epoch {
            self.ledger.push(epoch);
        }
        self.transition(LifecycleStage::Closed);
        self.observer.on_closed(&self.state);
        Ok(())
    }

    fn lp_holdings(&self, quote_price: f64) -> TokenHoldings {
        let pair = self.config.pair;
        tokens_from_liquidity(
            self.liquidity,
            1.0 / quote_price,
            pool_price_at_tick(self.range.tick_lower, pair),
            pool_price_at_tick(self.range.tick_upper, pair),
            pair,
        )
    }

    fn lp_value(&self, quote_price: f64) -> f64 {
        self.lp_holdings(quote_price).value_at(quote_price)
    }

    /// Fees collected but not yet redeployed into the range.
    fn unreinvested_fees(&self) -> f64 {
        self.state.current_capital_usd - self.allocated_capital_usd
            + self.state.current_epoch_fees_usd
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::compute(
            &self.state,
            &self.ledger,
            self.config.granularity,
            self.current_price,
            self.baseline_price,
        )
    }

    /// Snapshot for reporting. `is_last_period` marks the final row of a run.
    pub fn current_status(&self, is_last_period: bool) -> StatusSnapshot {
        let price = self.current_price;
        let holdings = self.lp_holdings(price);
        let total_value = holdings.value_at(price) + self.unreinvested_fees();
        let initial = self.config.initial_investment;
        let pnl = total_value - initial - self.state.total_gas_cost_usd;
        let hold_value = self.initial_holdings.value_at(price);
        let metrics = self.metrics();
        let in_range = self.range.contains_tick(self.current_tick);

        let apr = if self.config.use_compounding_apr {
            metrics.weighted_apr_pct
        } else {
            metrics.running_apr_pct
        };
        let pool_share = if self.total_pool_liquidity > 0.0 {
            self.liquidity / self.total_pool_liquidity * 100.0
        } else {
            0.0
        };
        let tvl_share = if self.current_tvl_usd > 0.0 {
            self.state.current_capital_usd / self.current_tvl_usd * 100.0
        } else {
            0.0
        };

        let mut note = match (self.stage, in_range) {
            (LifecycleStage::Closed, _) => "closed".to_string(),
            (_, true) => "in range".to_string(),
            (_, false) => "out of range".to_string(),
        };
        if is_last_period {
            note.push_str(", final period");
        }
        if self.state.degraded_periods > 0 {
            note.push_str(&format!(", {} degraded periods", self.state.degraded_periods));
        }

        StatusSnapshot {
            timestamp: self.last_timestamp,
            stage: self.stage,
            is_final: is_last_period,
            price,
            tick: self.current_tick,
            tick_lower: self.range.tick_lower,
            tick_upper: self.range.tick_upper,
            in_range,
            amount0: holdings.amount0,
            amount1: holdings.amount1,
            asset0_share_pct: holdings.asset0_share_pct(price),
            liquidity: self.liquidity,
            pool_share_pct: pool_share,
            tvl_share_pct: tvl_share,
            total_value_usd: total_value,
            pnl_usd: pnl,
            return_pct: if initial > 0.0 { pnl / initial * 100.0 } else { 0.0 },
            apr_pct: apr,
            hold_value_usd: hold_value,
            net_gain_vs_hold_usd: total_value - hold_value,
            initial_investment_usd: initial,
            current_capital_usd: self.state.current_capital_usd,
            degraded_periods: self.state.degraded_periods,
            metrics,
            note,
        }
    }

    // ─── Read-only accessors ────────────────────────────────────────

    pub fn config(&self) -> &PositionConfig {
        &self.config
    }

    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn ledger(&self) -> &[PositionEpoch] {
        &self.ledger
    }

    pub fn range(&self) -> &PositionRange {
        &self.range
    }

    /// Holdings at the last (re)allocation.
    pub fn initial_holdings(&self) -> TokenHoldings {
        self.initial_holdings
    }

    pub fn holdings(&self) -> TokenHoldings {
        self.lp_holdings(self.current_price)
    }

    pub fn liquidity(&self) -> f64 {
        self.liquidity
    }

    pub fn total_pool_liquidity(&self) -> f64 {
        self.total_pool_liquidity
    }

    pub fn baseline_price(&self) -> f64 {
        self.baseline_price
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn current_capital_usd(&self) -> f64 {
        self.state.current_capital_usd
    }

    pub fn cumulative_fees_usd(&self) -> f64 {
        self.state.cumulative_fees_usd
    }

    pub fn total_gas_cost_usd(&self) -> f64 {
        self.state.total_gas_cost_usd
    }

    pub fn rebalance_count(&self) -> u32 {
        self.state.rebalance_count
    }

    pub fn periods_in_range(&self) -> u64 {
        self.state.periods_in_range
    }

    pub fn total_periods(&self) -> u64 {
        self.state.total_periods
    }

    pub fn current_epoch_periods(&self) -> u64 {
        self.state.current_epoch_periods
    }

    pub fn current_epoch_fees_usd(&self) -> f64 {
        self.state.current_epoch_fees_usd
    }

    pub fn max_portfolio_value(&self) -> f64 {
        self.state.max_portfolio_value
    }

    pub fn min_portfolio_value_after_peak(&self) -> Option<f64> {
        self.state.min_portfolio_value_after_peak
    }

    pub fn degraded_periods(&self) -> u64 {
        self.state.degraded_periods
    }
}
