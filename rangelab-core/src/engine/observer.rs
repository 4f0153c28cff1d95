//! Logging port for the position lifecycle.
//!
//! The engine reports through a [`PositionObserver`] handed to it at
//! construction. It never writes to a global logger itself.

use crate::domain::{PositionEpoch, PositionRange};
use crate::engine::fees::Degradation;
use crate::engine::state::{LifecycleStage, PositionState};

/// Receives lifecycle notifications. Every method defaults to a no-op.
pub trait PositionObserver: Send + Sync {
    fn on_stage_change(&self, _from: LifecycleStage, _to: LifecycleStage) {}

    fn on_rebalance(&self, _epoch: &PositionEpoch, _new_range: &PositionRange) {}

    fn on_degraded_period(&self, _timestamp: i64, _degradation: Degradation) {}

    fn on_closed(&self, _state: &PositionState) {}
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl PositionObserver for NullObserver {}

/// Forwards notifications to `tracing` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PositionObserver for TracingObserver {
    fn on_stage_change(&self, from: LifecycleStage, to: LifecycleStage) {
        tracing::debug!(?from, ?to, "position stage change");
    }

    fn on_rebalance(&self, epoch: &PositionEpoch, new_range: &PositionRange) {
        tracing::info!(
            epoch_periods = epoch.duration_periods,
            epoch_fees_usd = epoch.fees_earned_usd,
            gas_cost_usd = epoch.gas_cost_usd,
            tick_lower = new_range.tick_lower,
            tick_upper = new_range.tick_upper,
            "position rebalanced"
        );
    }

    fn on_degraded_period(&self, timestamp: i64, degradation: Degradation) {
        tracing::warn!(timestamp, %degradation, "fee accrual degraded, period fee set to zero");
    }

    fn on_closed(&self, state: &PositionState) {
        tracing::info!(
            capital_usd = state.current_capital_usd,
            fees_usd = state.cumulative_fees_usd,
            gas_usd = state.total_gas_cost_usd,
            rebalances = state.rebalance_count,
            "position closed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<(LifecycleStage, LifecycleStage)>>,
    }

    impl PositionObserver for Recorder {
        fn on_stage_change(&self, from: LifecycleStage, to: LifecycleStage) {
            self.stages.lock().unwrap().push((from, to));
        }
    }

    #[test]
    fn default_methods_are_no_ops() {
        let observer = NullObserver;
        observer.on_closed(&PositionState::new(1.0));
        observer.on_degraded_period(0, Degradation::Sentinel);
    }

    #[test]
    fn custom_observer_receives_only_overridden_events() {
        let recorder = Recorder::default();
        recorder.on_stage_change(LifecycleStage::Initializing, LifecycleStage::Active);
        recorder.on_degraded_period(1, Degradation::Malformed);
        let stages = recorder.stages.lock().unwrap();
        assert_eq!(
            stages.as_slice(),
            &[(LifecycleStage::Initializing, LifecycleStage::Active)]
        );
    }
}
