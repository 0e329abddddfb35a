//! Time-window transfer limits
//!
//! This module provides:
//! - Limit rules and the bounded per-binding limit table
//! - Per-identity rolling counters
//! - The limit engine for checking and recording transfers

pub mod counters;
pub mod engine;
pub mod rules;

pub use counters::{CounterStore, TransferCounter};
pub use engine::{LimitEngine, LimitViolation};
pub use rules::{LimitTable, TimeTransferLimit, MAX_LIMITS};
