//! Scenario tests for the position lifecycle.

use std::sync::{Arc, Mutex};

use primitive_types::U256;
use rangelab_core::domain::{
    Granularity, MarketDataPoint, PositionEpoch, PositionRange, TokenPair, WidthSpec,
};
use rangelab_core::engine::{
    Degradation, LifecycleStage, Position, PositionConfig, PositionObserver, PositionSeed,
    PositionState,
};
use rangelab_core::math::{price_to_tick, quote_price_at_tick};
use rangelab_core::EngineError;

// ── Helpers ──────────────────────────────────────────────────────────

const USDC_WBTC: TokenPair = TokenPair {
    decimals0: 6,
    decimals1: 8,
};

fn btc_config() -> PositionConfig {
    PositionConfig::new(
        1_000.0,
        WidthSpec::Percent(10.0),
        2000,
        USDC_WBTC,
        Granularity::Daily,
    )
}

fn btc_seed() -> PositionSeed {
    PositionSeed {
        reference_tick: price_to_tick(100_000.0, USDC_WBTC).unwrap(),
        reference_tvl_usd: 25_000_000.0,
        reference_price: 100_000.0,
        total_pool_liquidity: 5e18,
    }
}

/// Fee-growth counter after `steps` increments of 2^110 (about 1.2 USD of
/// fees per step for the 1000 USD position).
fn growth(steps: u64) -> String {
    (U256::from(1u128 << 110) * U256::from(steps)).to_string()
}

fn point_at(ts: i64, tick: i32, growth0: String, growth1: String) -> MarketDataPoint {
    MarketDataPoint {
        timestamp: ts,
        tick: tick.to_string(),
        token0_price: quote_price_at_tick(tick, USDC_WBTC),
        low: None,
        high: None,
        fee_growth_global0_x128: growth0,
        fee_growth_global1_x128: growth1,
        tvl_usd: 25_000_000.0,
        liquidity: 5e18,
    }
}

/// Driver loop: rebalance when allowed, then update. Returns the indices of
/// the periods that rebalanced.
fn drive(position: &mut Position, points: &[MarketDataPoint], gas: f64) -> Vec<usize> {
    let mut rebalanced_at = Vec::new();
    for (i, point) in points.iter().enumerate() {
        let tick = point.parsed_tick().unwrap();
        let rebalanced = position.should_rebalance(tick);
        if rebalanced {
            position.rebalance(tick, point.tvl_usd, gas, false).unwrap();
            rebalanced_at.push(i);
        }
        position.update(point, rebalanced).unwrap();
    }
    rebalanced_at
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<(LifecycleStage, LifecycleStage)>>,
    rebalances: Mutex<Vec<(PositionEpoch, PositionRange)>>,
    degraded: Mutex<Vec<(i64, Degradation)>>,
    closed: Mutex<Option<PositionState>>,
}

impl PositionObserver for Recorder {
    fn on_stage_change(&self, from: LifecycleStage, to: LifecycleStage) {
        self.stages.lock().unwrap().push((from, to));
    }

    fn on_rebalance(&self, epoch: &PositionEpoch, new_range: &PositionRange) {
        self.rebalances.lock().unwrap().push((*epoch, *new_range));
    }

    fn on_degraded_period(&self, timestamp: i64, degradation: Degradation) {
        self.degraded.lock().unwrap().push((timestamp, degradation));
    }

    fn on_closed(&self, state: &PositionState) {
        *self.closed.lock().unwrap() = Some(*state);
    }
}

// ── Construction ─────────────────────────────────────────────────────

#[test]
fn ten_percent_btc_position_straddles_reference_price() {
    let position = Position::create(btc_config(), btc_seed()).unwrap();
    let range = position.range();

    assert!(range.price_lower < 100_000.0 && range.price_upper > 100_000.0);
    // spacing rounding widens the band, never narrows it
    assert!(range.price_lower <= 95_000.0);
    assert!(range.price_upper >= 105_000.0);
    assert!(range.price_lower > 85_000.0);
    assert!(range.price_upper < 115_000.0);
    assert_eq!(range.tick_lower % 2000, 0);
    assert_eq!(range.tick_upper % 2000, 0);

    let holdings = position.initial_holdings();
    assert!(holdings.amount0 > 0.0);
    assert!(holdings.amount1 > 0.0);
    assert!((holdings.value_at(100_000.0) - 1_000.0).abs() <= 0.01);
}

#[test]
fn full_range_position_splits_capital_evenly() {
    let config = PositionConfig {
        width: WidthSpec::FullRange,
        tick_spacing: 60,
        ..btc_config()
    };
    let position = Position::create(config, btc_seed()).unwrap();
    assert!(position.range().is_full_range());
    let share = position.initial_holdings().asset0_share_pct(100_000.0);
    assert!((share - 50.0).abs() < 0.1, "asset0 share {share}");
}

#[test]
fn unsupported_width_is_rejected_at_parse() {
    let err = "sideways".parse::<WidthSpec>().unwrap_err();
    assert_eq!(err.kind(), rangelab_core::ErrorKind::Configuration);
}

// ── Fees ─────────────────────────────────────────────────────────────

#[test]
fn identical_snapshots_yield_zero_second_period_fee() {
    let mut position = Position::create(btc_config(), btc_seed()).unwrap();
    let tick = btc_seed().reference_tick;
    let first = position
        .update(&point_at(1, tick, growth(10), growth(10)), false)
        .unwrap();
    let second = position
        .update(&point_at(2, tick, growth(10), growth(10)), false)
        .unwrap();
    assert_eq!(first.fee_usd, 0.0);
    assert_eq!(second.fee_usd, 0.0);
    assert!(second.in_range);
    assert_eq!(second.degradation, None);
}

#[test]
fn growing_counters_accrue_fees_in_range() {
    let mut position = Position::create(btc_config(), btc_seed()).unwrap();
    let tick = btc_seed().reference_tick;
    let points: Vec<_> = (0..10)
        .map(|i| point_at(i, tick, growth(i as u64), growth(i as u64)))
        .collect();
    drive(&mut position, &points, 0.0);

    assert!(position.cumulative_fees_usd() > 0.0);
    assert_eq!(position.periods_in_range(), 10);
    let status = position.current_status(false);
    assert!(status.apr_pct > 0.0);
    assert_eq!(status.metrics.time_in_range_pct, 100.0);
    assert!(status.total_value_usd > 1_000.0);
}

#[test]
fn out_of_range_periods_earn_nothing() {
    let config = btc_config().with_cooldown(1_000);
    let mut position = Position::create(config, btc_seed()).unwrap();
    let far = price_to_tick(150_000.0, USDC_WBTC).unwrap();
    let points: Vec<_> = (0..5)
        .map(|i| point_at(i, far, growth(i as u64 * 100), growth(0)))
        .collect();
    drive(&mut position, &points, 0.0);
    assert_eq!(position.cumulative_fees_usd(), 0.0);
    assert_eq!(position.periods_in_range(), 0);
    assert_eq!(position.rebalance_count(), 0);
}

#[test]
fn sentinel_period_is_degraded_and_run_continues() {
    let recorder = Arc::new(Recorder::default());
    let mut position =
        Position::create_observed(btc_config(), btc_seed(), recorder.clone()).unwrap();
    let tick = btc_seed().reference_tick;
    let points = vec![
        point_at(1, tick, growth(1), growth(1)),
        point_at(2, tick, U256::MAX.to_string(), growth(2)),
        point_at(3, tick, growth(3), growth(3)),
        point_at(4, tick, "not-a-number".into(), growth(4)),
        point_at(5, tick, growth(5), growth(5)),
    ];
    let reports: Vec<_> = points
        .iter()
        .map(|p| position.update(p, false).unwrap())
        .collect();

    assert_eq!(reports[1].degradation, Some(Degradation::Sentinel));
    assert_eq!(reports[1].fee_usd, 0.0);
    assert_eq!(reports[3].degradation, Some(Degradation::Malformed));
    // both deltas span two steps from the last valid snapshot
    assert!(reports[2].fee_usd > 0.0);
    assert!((reports[2].fee_usd - reports[4].fee_usd).abs() < reports[2].fee_usd * 1e-9);
    assert_eq!(position.degraded_periods(), 2);
    assert_eq!(position.total_periods(), 5);

    let degraded = recorder.degraded.lock().unwrap();
    assert_eq!(
        degraded.as_slice(),
        &[(2, Degradation::Sentinel), (4, Degradation::Malformed)]
    );
}

// ── Rebalancing ──────────────────────────────────────────────────────

#[test]
fn permanent_move_rebalances_once_with_cooldown_one() {
    let mut position = Position::create(btc_config(), btc_seed()).unwrap();
    let start = btc_seed().reference_tick;
    let far = price_to_tick(140_000.0, USDC_WBTC).unwrap();
    let mut points = vec![point_at(0, start, growth(0), growth(0))];
    points.extend((1..8).map(|i| point_at(i, far, growth(i as u64), growth(i as u64))));

    let rebalanced_at = drive(&mut position, &points, 3.0);
    assert_eq!(rebalanced_at, vec![1]);
    assert_eq!(position.rebalance_count(), 1);
    assert_eq!(position.total_gas_cost_usd(), 3.0);
    assert!(position.range().contains_tick(far));
}

#[test]
fn cooldown_delays_first_rebalance() {
    let config = btc_config().with_cooldown(3);
    let mut position = Position::create(config, btc_seed()).unwrap();
    let far = price_to_tick(60_000.0, USDC_WBTC).unwrap();
    let points: Vec<_> = (0..6)
        .map(|i| point_at(i, far, growth(0), growth(0)))
        .collect();
    let rebalanced_at = drive(&mut position, &points, 0.0);
    assert_eq!(rebalanced_at, vec![3]);
}

#[test]
fn rebalance_folds_fees_into_capital_and_resets_baseline() {
    let mut position = Position::create(btc_config(), btc_seed()).unwrap();
    let start = btc_seed().reference_tick;
    let points: Vec<_> = (0..5)
        .map(|i| point_at(i, start, growth(i as u64 * 4), growth(i as u64 * 4)))
        .collect();
    drive(&mut position, &points, 0.0);
    let fees = position.cumulative_fees_usd();
    assert!(fees > 0.0);

    let far = price_to_tick(120_000.0, USDC_WBTC).unwrap();
    position.rebalance(far, 1.0, 5.0, false).unwrap();

    assert!((position.current_capital_usd() - (1_000.0 + fees)).abs() < 1e-9);
    assert_eq!(position.total_gas_cost_usd(), 5.0);
    let baseline = position.baseline_price();
    assert!((baseline - quote_price_at_tick(far, USDC_WBTC)).abs() < 1e-6);
    let held = position.initial_holdings().value_at(baseline);
    assert!((held - position.current_capital_usd()).abs() < 0.01);

    let epoch = position.ledger()[0];
    assert_eq!(epoch.duration_periods, 5);
    assert!((epoch.fees_earned_usd - fees).abs() < 1e-12);
    assert_eq!(epoch.starting_capital_usd, 1_000.0);
}

#[test]
fn rebalance_when_centered_still_closes_epoch() {
    let mut position = Position::create(btc_config(), btc_seed()).unwrap();
    let tick = btc_seed().reference_tick;
    let range_before = *position.range();
    position.rebalance(tick, 1.0, 0.0, false).unwrap();
    assert_eq!(position.rebalance_count(), 1);
    assert_eq!(position.ledger().len(), 1);
    assert_eq!(position.range().tick_lower, range_before.tick_lower);
    assert_eq!(position.range().tick_upper, range_before.tick_upper);
}

// ── Close and observer ───────────────────────────────────────────────

#[test]
fn full_lifecycle_notifies_observer_and_balances_ledger() {
    let recorder = Arc::new(Recorder::default());
    let mut position =
        Position::create_observed(btc_config(), btc_seed(), recorder.clone()).unwrap();
    let start = btc_seed().reference_tick;
    let far = price_to_tick(130_000.0, USDC_WBTC).unwrap();
    let mut points: Vec<_> = (0..4)
        .map(|i| point_at(i, start, growth(i as u64), growth(i as u64)))
        .collect();
    points.extend((4..9).map(|i| point_at(i, far, growth(i as u64), growth(i as u64))));
    drive(&mut position, &points, 1.0);
    position.close(0.5).unwrap();

    use LifecycleStage::*;
    let stages = recorder.stages.lock().unwrap();
    assert_eq!(
        stages.as_slice(),
        &[
            (Initializing, Active),
            (Active, Rebalancing),
            (Rebalancing, Active),
            (Active, Closed),
        ]
    );
    assert_eq!(recorder.rebalances.lock().unwrap().len(), 1);
    assert!(recorder.closed.lock().unwrap().is_some());

    let ledger = position.ledger();
    assert_eq!(ledger.len(), position.rebalance_count() as usize + 1);
    let periods: u64 = ledger.iter().map(|e| e.duration_periods).sum();
    assert_eq!(periods, position.total_periods());
    assert_eq!(position.total_gas_cost_usd(), 1.5);

    let status = position.current_status(true);
    assert_eq!(status.stage, Closed);
    assert!(status.is_final);
    assert_eq!(status.timestamp, Some(8));
    assert!((status.metrics.time_in_range_pct - 100.0 * 8.0 / 9.0).abs() < 1e-9);
    assert_eq!(
        position.update(&points[0], false).unwrap_err(),
        EngineError::PositionClosed
    );
}

#[test]
fn compounding_mode_reports_weighted_apr() {
    let config = btc_config().with_compounding_apr(true);
    let mut position = Position::create(config, btc_seed()).unwrap();
    let tick = btc_seed().reference_tick;
    let points: Vec<_> = (0..6)
        .map(|i| point_at(i, tick, growth(i as u64), growth(i as u64)))
        .collect();
    drive(&mut position, &points, 0.0);
    let status = position.current_status(false);
    assert_eq!(status.apr_pct, status.metrics.weighted_apr_pct);
    assert!(status.metrics.weighted_apr_pct > 0.0);
}

#[test]
fn drawdown_is_zero_until_first_peak() {
    let mut position = Position::create(btc_config(), btc_seed()).unwrap();
    let start = btc_seed().reference_tick;
    // price falls: LP value drops below the initial investment
    let points: Vec<_> = (0..4)
        .map(|i| point_at(i, start + 300 * i as i32, growth(0), growth(0)))
        .collect();
    drive(&mut position, &points, 0.0);
    assert_eq!(position.min_portfolio_value_after_peak(), None);
    assert_eq!(position.current_status(false).metrics.current_drawdown_pct, 0.0);
}
