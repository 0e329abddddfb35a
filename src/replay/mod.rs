//! Scenario replay
//!
//! Loads a JSON scenario describing compliance bindings and a timestamped
//! list of transfers, then plays the compliance role against a fresh module:
//! each transfer is checked and, when allowed, recorded.

use crate::errors::{LimitGuardError, Result};
use crate::identity::IdentityRegistry;
use crate::module::{
    deploy, Clock, ComplianceModule, EventLog, ManualClock, ModuleContext, ModuleEvent,
    TimeTransfersLimitsModule, TokenAgentRegistry,
};
use crate::policy::{TimeTransferLimit, TransferCounter};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Account to identity mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub account: Address,
    pub identity: Address,
}

/// Initial state of one compliance binding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingSetup {
    pub compliance: Address,
    #[serde(default)]
    pub limits: Vec<TimeTransferLimit>,
    #[serde(default)]
    pub token_agents: Vec<Address>,
    #[serde(default)]
    pub identities: Vec<IdentityEntry>,
}

/// A transfer to replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferStep {
    pub compliance: Address,
    pub from: Address,
    pub to: Address,
    pub amount: u128,
    /// Unix timestamp the transfer happens at
    pub at: u64,
}

/// Scenario file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Clock value before the first transfer
    #[serde(default)]
    pub start_time: u64,
    #[serde(default)]
    pub bindings: Vec<BindingSetup>,
    #[serde(default)]
    pub transfers: Vec<TransferStep>,
}

impl Scenario {
    /// Load from file
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| LimitGuardError::ConfigError(e.to_string()))
    }
}

/// Decision taken for one transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub index: usize,
    pub compliance: Address,
    pub from: Address,
    pub to: Address,
    pub amount: u128,
    pub at: u64,
    pub allowed: bool,
}

/// Counter state at the end of a replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub compliance: Address,
    pub identity: Address,
    pub limit_time: u32,
    pub counter: TransferCounter,
}

/// Everything a replay produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    pub outcomes: Vec<TransferOutcome>,
    pub events: Vec<ModuleEvent>,
    pub counters: Vec<CounterSnapshot>,
}

impl ReplayReport {
    pub fn allowed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.allowed).count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.len() - self.allowed()
    }
}

/// Replays a scenario against a freshly deployed module
pub struct Replayer {
    owner: Address,
    record_exempt_transfers: bool,
}

impl Replayer {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            record_exempt_transfers: false,
        }
    }

    pub fn record_exempt_transfers(mut self, record: bool) -> Self {
        self.record_exempt_transfers = record;
        self
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ReplayReport> {
        let clock = ManualClock::new(scenario.start_time);
        let events = EventLog::new();

        let mut identities = IdentityRegistry::new();
        let mut agents = TokenAgentRegistry::new();
        for binding in &scenario.bindings {
            for entry in &binding.identities {
                identities.register(binding.compliance, entry.account, entry.identity);
            }
            for agent in &binding.token_agents {
                agents.add_agent(binding.compliance, *agent);
            }
        }

        info!(
            "Replaying {} transfers over {} bindings ({} registered accounts)",
            scenario.transfers.len(),
            scenario.bindings.len(),
            identities.len()
        );
        if identities.is_empty() && !scenario.transfers.is_empty() {
            warn!("No identities registered, every sender shares the zero identity");
        }

        let ctx = ModuleContext {
            clock: Arc::new(clock.clone()),
            identities: Arc::new(identities.clone()),
            exemptions: Arc::new(agents),
            events: Arc::new(events.clone()),
        };
        let mut module = deploy(ctx, self.owner)?
            .with_record_exempt_transfers(self.record_exempt_transfers);

        for binding in &scenario.bindings {
            let compliance = binding.compliance;
            module.bind_compliance(&compliance, compliance)?;
            module.batch_set_limits(&compliance, &binding.limits)?;
        }

        let mut report = ReplayReport::default();
        for (index, step) in scenario.transfers.iter().enumerate() {
            if step.at < clock.now() {
                warn!(
                    "Transfer {} at {} is earlier than the clock ({}), replaying at clock time",
                    index,
                    step.at,
                    clock.now()
                );
            }
            clock.set(step.at);

            let allowed = module.check_transfer(&step.from, &step.to, step.amount, &step.compliance);
            if allowed {
                module.record_transfer(&step.compliance, &step.from, &step.to, step.amount)?;
            }
            debug!(
                "Transfer {}: {} -> {} amount {} allowed={}",
                index, step.from, step.to, step.amount, allowed
            );

            report.outcomes.push(TransferOutcome {
                index,
                compliance: step.compliance,
                from: step.from,
                to: step.to,
                amount: step.amount,
                at: clock.now(),
                allowed,
            });
        }

        report.counters = snapshot_counters(&module, scenario, &identities);
        report.events = events.drain();

        info!(
            "Replayed {} transfers: {} allowed, {} rejected",
            report.outcomes.len(),
            report.allowed(),
            report.rejected()
        );
        Ok(report)
    }
}

fn snapshot_counters(
    module: &TimeTransfersLimitsModule,
    scenario: &Scenario,
    identities: &IdentityRegistry,
) -> Vec<CounterSnapshot> {
    use crate::identity::IdentityResolver;

    let mut seen = std::collections::BTreeSet::new();
    for step in &scenario.transfers {
        seen.insert((step.compliance, identities.identity(&step.compliance, &step.from)));
    }

    let mut snapshots = Vec::new();
    for (compliance, identity) in seen {
        for limit in module.list_limits(&compliance) {
            let counter = module.query_counter(&compliance, &identity, limit.limit_time);
            if counter != TransferCounter::default() {
                snapshots.push(CounterSnapshot {
                    compliance,
                    identity,
                    limit_time: limit.limit_time,
                    counter,
                });
            }
        }
    }
    snapshots
}
