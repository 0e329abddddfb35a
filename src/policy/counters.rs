//! Per-identity rolling counters
//!
//! Counters are keyed by (identity, window length) within a binding. They are
//! never swept: an elapsed counter stays in the store until the next recorded
//! transfer resets it.

use crate::errors::{LimitGuardError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value accumulated by one identity in one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferCounter {
    /// Amount transferred in the current window
    pub value: u128,
    /// Unix timestamp at which the current window ends
    pub timer: u64,
}

impl TransferCounter {
    /// A window is finished once `now` is strictly past its end
    pub fn is_finished(&self, now: u64) -> bool {
        now > self.timer
    }
}

/// Value a window would hold after `amount`, without touching the store.
///
/// A missing or finished counter counts as a fresh window. `None` when the
/// sum does not fit in a `u128`.
pub fn projected_value(counter: Option<&TransferCounter>, amount: u128, now: u64) -> Option<u128> {
    match counter {
        Some(c) if !c.is_finished(now) => c.value.checked_add(amount),
        _ => Some(amount),
    }
}

/// What a recording did to a counter, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterUpdate {
    Started,
    Accumulated,
}

/// Counters for a single binding
#[derive(Debug, Clone, Default)]
pub struct CounterStore {
    counters: HashMap<(Address, u32), TransferCounter>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &Address, limit_time: u32) -> Option<&TransferCounter> {
        self.counters.get(&(*identity, limit_time))
    }

    /// Read a counter; an absent one reads as zero
    pub fn read(&self, identity: &Address, limit_time: u32) -> TransferCounter {
        self.get(identity, limit_time).copied().unwrap_or_default()
    }

    /// Record `amount` against one window: reset if fresh or finished, else add.
    ///
    /// Fails with `CounterOverflow`, leaving the counter untouched, when the
    /// live value plus `amount` does not fit in a `u128`.
    pub fn record(
        &mut self,
        identity: &Address,
        limit_time: u32,
        amount: u128,
        now: u64,
    ) -> Result<(CounterUpdate, TransferCounter)> {
        let key = (*identity, limit_time);
        let next = match self.counters.get(&key) {
            Some(c) if !c.is_finished(now) => {
                let value = c
                    .value
                    .checked_add(amount)
                    .ok_or(LimitGuardError::CounterOverflow { limit_time })?;
                (CounterUpdate::Accumulated, TransferCounter { value, timer: c.timer })
            }
            _ => (
                CounterUpdate::Started,
                TransferCounter {
                    value: amount,
                    timer: now.saturating_add(u64::from(limit_time)),
                },
            ),
        };

        self.counters.insert(key, next.1);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000;

    fn alice() -> Address {
        Address::from_low_u8(0xa1)
    }

    #[test]
    fn test_first_record_starts_window() {
        let mut store = CounterStore::new();
        let (update, counter) = store.record(&alice(), 10, 80, T).unwrap();

        assert_eq!(update, CounterUpdate::Started);
        assert_eq!(counter, TransferCounter { value: 80, timer: T + 10 });
    }

    #[test]
    fn test_live_window_accumulates() {
        let mut store = CounterStore::new();
        store.record(&alice(), 150, 20, T).unwrap();
        let (update, counter) = store.record(&alice(), 150, 30, T + 10).unwrap();

        assert_eq!(update, CounterUpdate::Accumulated);
        assert_eq!(counter.value, 50);
        assert_eq!(counter.timer, T + 150);
    }

    #[test]
    fn test_finished_window_resets() {
        let mut store = CounterStore::new();
        store.record(&alice(), 10, 20, T).unwrap();
        let (update, counter) = store.record(&alice(), 10, 30, T + 30).unwrap();

        assert_eq!(update, CounterUpdate::Started);
        assert_eq!(counter, TransferCounter { value: 30, timer: T + 40 });
    }

    #[test]
    fn test_window_still_live_at_expiry() {
        let mut store = CounterStore::new();
        store.record(&alice(), 10, 20, T).unwrap();
        let (update, counter) = store.record(&alice(), 10, 5, T + 10).unwrap();

        assert_eq!(update, CounterUpdate::Accumulated);
        assert_eq!(counter.value, 25);
    }

    #[test]
    fn test_first_record_at_time_zero() {
        let mut store = CounterStore::new();
        let (_, counter) = store.record(&alice(), 10, 7, 0).unwrap();
        assert_eq!(counter, TransferCounter { value: 7, timer: 10 });
    }

    #[test]
    fn test_projected_value() {
        let live = TransferCounter { value: 100, timer: T + 10 };

        assert_eq!(projected_value(None, 40, T), Some(40));
        assert_eq!(projected_value(Some(&live), 40, T), Some(140));
        assert_eq!(projected_value(Some(&live), 40, T + 11), Some(40));
    }

    #[test]
    fn test_read_missing_is_zero() {
        let store = CounterStore::new();
        assert_eq!(store.read(&alice(), 10), TransferCounter::default());
        assert!(store.get(&alice(), 10).is_none());
    }

    #[test]
    fn test_projected_value_overflow() {
        let live = TransferCounter { value: u128::MAX - 10, timer: T + 10 };

        assert_eq!(projected_value(Some(&live), 10, T), Some(u128::MAX));
        assert_eq!(projected_value(Some(&live), 11, T), None);
        // A finished window starts over, so no overflow
        assert_eq!(projected_value(Some(&live), 100, T + 11), Some(100));
    }

    #[test]
    fn test_record_overflow_leaves_counter_untouched() {
        let mut store = CounterStore::new();
        store.record(&alice(), 10, u128::MAX - 10, T).unwrap();

        let err = store.record(&alice(), 10, 100, T + 1).unwrap_err();
        assert_eq!(err, LimitGuardError::CounterOverflow { limit_time: 10 });
        assert_eq!(
            store.read(&alice(), 10),
            TransferCounter { value: u128::MAX - 10, timer: T + 10 }
        );
    }
}
