//! Module notifications

use crate::types::Address;
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Observable state changes of the limit registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum ModuleEvent {
    /// A limit was inserted or its value overwritten
    TimeTransferLimitUpdated {
        compliance: Address,
        limit_time: u32,
        limit_value: u128,
    },

    TimeTransferLimitRemoved { compliance: Address, limit_time: u32 },
}

/// Receiver of module events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ModuleEvent);
}

/// In-memory event log. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ModuleEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all events logged so far
    pub fn drain(&self) -> Vec<ModuleEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: ModuleEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
