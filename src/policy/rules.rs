//! Time transfer limit rules
//!
//! A compliance binding carries a small table of rolling-window limits:
//! - at most [`MAX_LIMITS`] entries
//! - one entry per window length
//! - insertion order, disturbed only by swap-removal

use crate::errors::{LimitGuardError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Maximum number of limits a single binding may configure
pub const MAX_LIMITS: usize = 4;

/// A rolling-window transfer limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTransferLimit {
    /// Window length in seconds
    pub limit_time: u32,
    /// Maximum cumulative value per window
    pub limit_value: u128,
}

impl TimeTransferLimit {
    pub fn new(limit_time: u32, limit_value: u128) -> Self {
        Self {
            limit_time,
            limit_value,
        }
    }

    /// Human-readable description of the limit
    pub fn description(&self) -> String {
        format!(
            "Max value: {} per {}",
            self.limit_value,
            self.period_description()
        )
    }

    fn period_description(&self) -> String {
        match self.limit_time {
            3600 => "hour".to_string(),
            86400 => "day".to_string(),
            604800 => "week".to_string(),
            secs => format!("{} seconds", secs),
        }
    }
}

/// Outcome of an upsert, for logging only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Inserted,
    Updated,
}

/// Bounded table of limits for one binding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitTable {
    limits: Vec<TimeTransferLimit>,
}

impl LimitTable {
    pub fn new() -> Self {
        Self {
            limits: Vec::with_capacity(MAX_LIMITS),
        }
    }

    /// Insert a limit, or overwrite the value of the one with the same window.
    ///
    /// An existing entry keeps its position. A new entry is appended.
    pub fn set(&mut self, compliance: &Address, limit: TimeTransferLimit) -> Result<SetOutcome> {
        if limit.limit_time == 0 {
            return Err(LimitGuardError::InvalidWindowLength);
        }

        if let Some(existing) = self
            .limits
            .iter_mut()
            .find(|l| l.limit_time == limit.limit_time)
        {
            existing.limit_value = limit.limit_value;
            return Ok(SetOutcome::Updated);
        }

        if self.limits.len() >= MAX_LIMITS {
            return Err(LimitGuardError::CapacityExceeded {
                compliance: compliance.to_string(),
                max: MAX_LIMITS,
            });
        }

        self.limits.push(limit);
        Ok(SetOutcome::Inserted)
    }

    /// Remove the limit for `limit_time`.
    ///
    /// The last entry moves into the vacated slot.
    pub fn remove(&mut self, compliance: &Address, limit_time: u32) -> Result<TimeTransferLimit> {
        let index = self
            .position(limit_time)
            .ok_or_else(|| LimitGuardError::WindowNotFound {
                compliance: compliance.to_string(),
                limit_time,
            })?;

        Ok(self.limits.swap_remove(index))
    }

    fn position(&self, limit_time: u32) -> Option<usize> {
        self.limits.iter().position(|l| l.limit_time == limit_time)
    }

    pub fn get(&self, limit_time: u32) -> Option<&TimeTransferLimit> {
        self.limits.iter().find(|l| l.limit_time == limit_time)
    }

    pub fn as_slice(&self) -> &[TimeTransferLimit] {
        &self.limits
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeTransferLimit> {
        self.limits.iter()
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }
}
