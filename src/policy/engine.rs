//! Limit engine
//!
//! Owns the limit tables and counters of every binding and answers the two
//! transfer-time questions: would this transfer exceed a window (pure), and
//! record a transfer that has happened (the only counter writer).

use crate::errors::{LimitGuardError, Result};
use crate::policy::counters::{projected_value, CounterStore, CounterUpdate, TransferCounter};
use crate::policy::rules::{LimitTable, SetOutcome, TimeTransferLimit};
use crate::types::Address;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Limits and counters of one compliance binding
#[derive(Debug, Clone, Default)]
pub struct BindingState {
    pub limits: LimitTable,
    pub counters: CounterStore,
}

/// First window a prospective transfer would break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitViolation {
    pub limit: TimeTransferLimit,
    /// Projected window value; `None` when it overflows `u128`
    pub projected: Option<u128>,
}

/// Engine holding the state of all bindings
#[derive(Debug, Default)]
pub struct LimitEngine {
    bindings: HashMap<Address, BindingState>,
}

impl LimitEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self, compliance: &Address) -> &mut BindingState {
        self.bindings.entry(*compliance).or_default()
    }

    /// Upsert one limit
    pub fn set_limit(
        &mut self,
        compliance: &Address,
        limit: TimeTransferLimit,
    ) -> Result<SetOutcome> {
        let outcome = self.state_mut(compliance).limits.set(compliance, limit)?;
        info!(
            "Limit {:?} on {}: {}",
            outcome,
            compliance,
            limit.description()
        );
        Ok(outcome)
    }

    /// Upsert several limits in order. Nothing is committed unless all succeed.
    pub fn batch_set_limits(
        &mut self,
        compliance: &Address,
        limits: &[TimeTransferLimit],
    ) -> Result<()> {
        let mut staged = self
            .bindings
            .get(compliance)
            .map(|s| s.limits.clone())
            .unwrap_or_default();

        for limit in limits {
            staged.set(compliance, *limit)?;
        }

        self.state_mut(compliance).limits = staged;
        info!("Set {} limits on {}", limits.len(), compliance);
        Ok(())
    }

    /// Remove one limit. Existing counters for the window are left in place.
    pub fn remove_limit(&mut self, compliance: &Address, limit_time: u32) -> Result<()> {
        let removed = self.state_mut(compliance).limits.remove(compliance, limit_time)?;
        info!("Removed limit on {}: {}", compliance, removed.description());
        Ok(())
    }

    /// Remove several limits in order. Nothing is committed unless all succeed.
    pub fn batch_remove_limits(&mut self, compliance: &Address, limit_times: &[u32]) -> Result<()> {
        let mut staged = self
            .bindings
            .get(compliance)
            .map(|s| s.limits.clone())
            .unwrap_or_default();

        for &limit_time in limit_times {
            staged.remove(compliance, limit_time)?;
        }

        self.state_mut(compliance).limits = staged;
        info!("Removed {} limits from {}", limit_times.len(), compliance);
        Ok(())
    }

    /// Configured limits of a binding, in table order
    pub fn limits(&self, compliance: &Address) -> &[TimeTransferLimit] {
        self.bindings
            .get(compliance)
            .map(|s| s.limits.as_slice())
            .unwrap_or(&[])
    }

    /// Counter of `identity` for `limit_time`; absent counters read as zero
    pub fn counter(&self, compliance: &Address, identity: &Address, limit_time: u32) -> TransferCounter {
        self.bindings
            .get(compliance)
            .map(|s| s.counters.read(identity, limit_time))
            .unwrap_or_default()
    }

    /// Find the first configured window that `amount` would push over its cap
    pub fn evaluate(
        &self,
        compliance: &Address,
        identity: &Address,
        amount: u128,
        now: u64,
    ) -> Option<LimitViolation> {
        let state = self.bindings.get(compliance)?;

        state.limits.iter().find_map(|limit| {
            let counter = state.counters.get(identity, limit.limit_time);
            let projected = projected_value(counter, amount, now);
            match projected {
                Some(value) if value <= limit.limit_value => None,
                _ => Some(LimitViolation {
                    limit: *limit,
                    projected,
                }),
            }
        })
    }

    /// Whether a transfer would exceed any window. Never mutates counters.
    pub fn would_exceed(
        &self,
        compliance: &Address,
        identity: &Address,
        amount: u128,
        now: u64,
        exempt: bool,
    ) -> bool {
        if exempt {
            return false;
        }

        match self.evaluate(compliance, identity, amount, now) {
            Some(violation) => {
                debug!(
                    "Transfer of {} by {} on {} would exceed {} (projected {:?})",
                    amount,
                    identity,
                    compliance,
                    violation.limit.description(),
                    violation.projected
                );
                true
            }
            None => false,
        }
    }

    /// Record an executed transfer against every configured window.
    ///
    /// Nothing is written if any live window would overflow.
    pub fn record_transfer(
        &mut self,
        compliance: &Address,
        identity: &Address,
        amount: u128,
        now: u64,
    ) -> Result<()> {
        let Some(state) = self.bindings.get_mut(compliance) else {
            return Ok(());
        };

        let BindingState { limits, counters } = state;
        if let Some(limit) = limits.iter().find(|l| {
            projected_value(counters.get(identity, l.limit_time), amount, now).is_none()
        }) {
            warn!(
                "Counter overflow recording {} for {} on {} ({}s window)",
                amount, identity, compliance, limit.limit_time
            );
            return Err(LimitGuardError::CounterOverflow {
                limit_time: limit.limit_time,
            });
        }

        for limit in limits.iter() {
            let (update, counter) = counters.record(identity, limit.limit_time, amount, now)?;
            match update {
                CounterUpdate::Started => debug!(
                    "Started {}s window for {} on {}: value {}, ends at {}",
                    limit.limit_time, identity, compliance, counter.value, counter.timer
                ),
                CounterUpdate::Accumulated => debug!(
                    "Accumulated {}s window for {} on {}: value {}",
                    limit.limit_time, identity, compliance, counter.value
                ),
            }
        }
        Ok(())
    }

    /// Drop all limits and counters of a binding
    pub fn clear_binding(&mut self, compliance: &Address) {
        if self.bindings.remove(compliance).is_some() {
            info!("Cleared limits and counters of {}", compliance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000;

    fn compliance() -> Address {
        Address::from_low_u8(0xc0)
    }

    fn alice() -> Address {
        Address::from_low_u8(0xa1)
    }

    fn limit_times(engine: &LimitEngine) -> Vec<u32> {
        engine.limits(&compliance()).iter().map(|l| l.limit_time).collect()
    }

    #[test]
    fn test_no_limits_never_exceeds() {
        let engine = LimitEngine::new();
        assert!(!engine.would_exceed(&compliance(), &alice(), u128::MAX, T, false));
        assert!(engine.limits(&compliance()).is_empty());
    }

    #[test]
    fn test_exceeds_without_history() {
        let mut engine = LimitEngine::new();
        engine
            .set_limit(&compliance(), TimeTransferLimit::new(10, 50))
            .unwrap();

        assert!(engine.would_exceed(&compliance(), &alice(), 100, T, false));
        assert!(!engine.would_exceed(&compliance(), &alice(), 50, T, false));
        assert!(!engine.would_exceed(&compliance(), &alice(), 100, T, true));
    }

    #[test]
    fn test_counter_history() {
        let mut engine = LimitEngine::new();
        engine
            .set_limit(&compliance(), TimeTransferLimit::new(10, 120))
            .unwrap();
        engine.record_transfer(&compliance(), &alice(), 100, T).unwrap();

        assert!(engine.would_exceed(&compliance(), &alice(), 100, T, false));
        assert!(!engine.would_exceed(&compliance(), &alice(), 20, T, false));

        // Window finished
        assert!(!engine.would_exceed(&compliance(), &alice(), 100, T + 30, false));
    }

    #[test]
    fn test_evaluate_reports_first_violation() {
        let mut engine = LimitEngine::new();
        engine
            .batch_set_limits(
                &compliance(),
                &[TimeTransferLimit::new(10, 500), TimeTransferLimit::new(20, 30)],
            )
            .unwrap();

        let violation = engine.evaluate(&compliance(), &alice(), 40, T).unwrap();
        assert_eq!(violation.limit.limit_time, 20);
        assert_eq!(violation.projected, Some(40));
    }

    #[test]
    fn test_would_exceed_is_pure() {
        let mut engine = LimitEngine::new();
        engine
            .set_limit(&compliance(), TimeTransferLimit::new(10, 120))
            .unwrap();
        engine.record_transfer(&compliance(), &alice(), 60, T).unwrap();
        let before = engine.counter(&compliance(), &alice(), 10);

        for _ in 0..5 {
            assert!(!engine.would_exceed(&compliance(), &alice(), 60, T + 1, false));
        }
        assert_eq!(engine.counter(&compliance(), &alice(), 10), before);
    }

    #[test]
    fn test_record_without_limits_is_noop() {
        let mut engine = LimitEngine::new();
        engine.record_transfer(&compliance(), &alice(), 100, T).unwrap();
        assert_eq!(
            engine.counter(&compliance(), &alice(), 10),
            TransferCounter::default()
        );
    }

    #[test]
    fn test_batch_set_is_all_or_nothing() {
        let mut engine = LimitEngine::new();
        engine
            .batch_set_limits(
                &compliance(),
                &[TimeTransferLimit::new(1, 1), TimeTransferLimit::new(2, 2)],
            )
            .unwrap();

        let err = engine
            .batch_set_limits(
                &compliance(),
                &[
                    TimeTransferLimit::new(1, 10),
                    TimeTransferLimit::new(3, 3),
                    TimeTransferLimit::new(4, 4),
                    TimeTransferLimit::new(5, 5),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, LimitGuardError::CapacityExceeded { .. }));
        assert_eq!(limit_times(&engine), vec![1, 2]);
        assert_eq!(engine.limits(&compliance())[0].limit_value, 1);
    }

    #[test]
    fn test_batch_remove_is_all_or_nothing() {
        let mut engine = LimitEngine::new();
        engine
            .batch_set_limits(
                &compliance(),
                &[
                    TimeTransferLimit::new(1, 100),
                    TimeTransferLimit::new(2, 200),
                    TimeTransferLimit::new(3, 300),
                ],
            )
            .unwrap();

        let err = engine
            .batch_remove_limits(&compliance(), &[1, 9])
            .unwrap_err();
        assert!(matches!(err, LimitGuardError::WindowNotFound { limit_time: 9, .. }));
        assert_eq!(limit_times(&engine), vec![1, 2, 3]);

        engine.batch_remove_limits(&compliance(), &[1, 3]).unwrap();
        assert_eq!(limit_times(&engine), vec![2]);
    }

    #[test]
    fn test_removed_limit_counter_is_inert() {
        let mut engine = LimitEngine::new();
        engine
            .set_limit(&compliance(), TimeTransferLimit::new(10, 120))
            .unwrap();
        engine.record_transfer(&compliance(), &alice(), 100, T).unwrap();
        engine.remove_limit(&compliance(), 10).unwrap();

        // Counter survives but is no longer consulted
        assert_eq!(engine.counter(&compliance(), &alice(), 10).value, 100);
        assert!(!engine.would_exceed(&compliance(), &alice(), 1000, T, false));
    }

    #[test]
    fn test_bindings_are_isolated() {
        let other = Address::from_low_u8(0xc1);
        let mut engine = LimitEngine::new();
        engine
            .set_limit(&compliance(), TimeTransferLimit::new(10, 50))
            .unwrap();
        engine.set_limit(&other, TimeTransferLimit::new(10, 500)).unwrap();
        engine.record_transfer(&compliance(), &alice(), 40, T).unwrap();

        assert_eq!(engine.counter(&other, &alice(), 10).value, 0);
        assert!(!engine.would_exceed(&other, &alice(), 100, T, false));

        engine.clear_binding(&compliance());
        assert!(engine.limits(&compliance()).is_empty());
        assert_eq!(engine.limits(&other).len(), 1);
    }

    #[test]
    fn test_overflowing_transfer_exceeds_max_cap() {
        let mut engine = LimitEngine::new();
        engine
            .set_limit(&compliance(), TimeTransferLimit::new(10, u128::MAX))
            .unwrap();
        engine
            .record_transfer(&compliance(), &alice(), u128::MAX - 10, 100)
            .unwrap();

        assert!(!engine.would_exceed(&compliance(), &alice(), 10, 101, false));
        assert!(engine.would_exceed(&compliance(), &alice(), 100, 101, false));

        let violation = engine.evaluate(&compliance(), &alice(), 100, 101).unwrap();
        assert_eq!(violation.projected, None);
    }

    #[test]
    fn test_overflowing_record_writes_nothing() {
        let mut engine = LimitEngine::new();
        engine
            .batch_set_limits(
                &compliance(),
                &[TimeTransferLimit::new(5, u128::MAX), TimeTransferLimit::new(10, u128::MAX)],
            )
            .unwrap();
        engine
            .record_transfer(&compliance(), &alice(), u128::MAX - 10, 100)
            .unwrap();

        // The 5s window has finished, the 10s one is still live
        let err = engine
            .record_transfer(&compliance(), &alice(), 100, 106)
            .unwrap_err();
        assert_eq!(err, LimitGuardError::CounterOverflow { limit_time: 10 });

        let five = engine.counter(&compliance(), &alice(), 5);
        assert_eq!(five.value, u128::MAX - 10);
        assert_eq!(five.timer, 105);
        assert_eq!(engine.counter(&compliance(), &alice(), 10).value, u128::MAX - 10);
    }
}
