//! Property tests for the driver loop over random synthetic series.
//!
//! Uses proptest to verify:
//! 1. Epoch durations always add up to the number of periods
//! 2. Time in range stays within [0, 100]
//! 3. Fees are never negative and synthetic counters never degrade

use proptest::prelude::*;
use rangelab_core::domain::{TokenPair, WidthSpec};
use rangelab_runner::{
    generate_series, run_simulation, LoadedSeries, SimulationConfig, SyntheticSpec,
};

const BASE: &str = r#"
[position]
initial_investment = 1000.0
width = "10%"
tick_spacing = 60
decimals0 = 6
decimals1 = 8
granularity = "hourly"

[rebalance]
gas_cost_usd = 1.5
"#;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_width() -> impl Strategy<Value = WidthSpec> {
    prop_oneof![
        1 => Just(WidthSpec::FullRange),
        4 => (1.0..50.0_f64).prop_map(WidthSpec::Percent),
    ]
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ledger_covers_every_period(
        seed in any::<u64>(),
        periods in 2usize..200,
        width in arb_width(),
        cooldown in 1u64..48,
    ) {
        let config = SimulationConfig::from_toml(BASE).unwrap().with_strategy(width, cooldown);
        let spec = SyntheticSpec::new(periods, seed, TokenPair::new(6, 8));
        let series = LoadedSeries::new(generate_series(&spec).unwrap(), true).unwrap();
        let result = run_simulation(&config, &series).unwrap();

        let total: u64 = result.epochs.iter().map(|e| e.duration_periods).sum();
        prop_assert_eq!(total as usize, result.periods.len());
        prop_assert_eq!(result.periods.len(), periods);
        prop_assert_eq!(result.epochs.len(), result.rebalance_count() + 1);

        let in_range = result.status.metrics.time_in_range_pct;
        prop_assert!((0.0..=100.0).contains(&in_range), "time in range {}", in_range);

        prop_assert!(result.periods.iter().all(|r| r.fee_usd >= 0.0));
        prop_assert_eq!(result.degraded_count(), 0);
    }
}
