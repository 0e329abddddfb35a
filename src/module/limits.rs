//! Time transfers limits module
//!
//! The rule module a compliance framework binds to. Limit configuration and
//! the transfer hooks are only accepted from bound compliances; the owner
//! gate covers module administration.

use crate::errors::Result;
use crate::identity::IdentityResolver;
use crate::module::auth::{ComplianceGate, Ownership};
use crate::module::clock::Clock;
use crate::module::events::{EventSink, ModuleEvent};
use crate::module::exemption::ExemptionPolicy;
use crate::module::ComplianceModule;
use crate::policy::{LimitEngine, TimeTransferLimit, TransferCounter};
use crate::types::Address;
use std::sync::Arc;
use tracing::{debug, info};

/// Name reported by [`ComplianceModule::module_name`]
pub const MODULE_NAME: &str = "TimeTransfersLimitsModule";

/// Collaborators supplied by the host framework
#[derive(Clone)]
pub struct ModuleContext {
    pub clock: Arc<dyn Clock>,
    pub identities: Arc<dyn IdentityResolver>,
    pub exemptions: Arc<dyn ExemptionPolicy>,
    pub events: Arc<dyn EventSink>,
}

/// Rolling time-window transfer limits, per compliance binding
pub struct TimeTransfersLimitsModule {
    ownership: Ownership,
    gate: ComplianceGate,
    engine: LimitEngine,
    ctx: ModuleContext,
    /// Also record transfers from exempt senders
    record_exempt_transfers: bool,
}

impl TimeTransfersLimitsModule {
    /// Create an uninitialized module
    pub fn new(ctx: ModuleContext) -> Self {
        Self {
            ownership: Ownership::new(),
            gate: ComplianceGate::new(),
            engine: LimitEngine::new(),
            ctx,
            record_exempt_transfers: false,
        }
    }

    pub fn with_record_exempt_transfers(mut self, record: bool) -> Self {
        self.record_exempt_transfers = record;
        self
    }

    /// One-time setup; `caller` becomes the owner
    pub fn initialize(&mut self, caller: Address) -> Result<()> {
        self.ownership.initialize(caller)
    }

    pub fn owner(&self) -> Option<Address> {
        self.ownership.owner()
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        self.ownership.transfer_ownership(caller, new_owner)
    }

    /// Insert or update the limit for `limit.limit_time` on the calling compliance
    pub fn set_limit(&mut self, caller: &Address, limit: TimeTransferLimit) -> Result<()> {
        self.gate.ensure_bound(caller)?;
        self.engine.set_limit(caller, limit)?;
        self.emit_updated(caller, &limit);
        Ok(())
    }

    /// Set several limits in order; all or nothing
    pub fn batch_set_limits(&mut self, caller: &Address, limits: &[TimeTransferLimit]) -> Result<()> {
        self.gate.ensure_bound(caller)?;
        self.engine.batch_set_limits(caller, limits)?;
        for limit in limits {
            self.emit_updated(caller, limit);
        }
        Ok(())
    }

    /// Remove the limit for `limit_time` on the calling compliance
    pub fn remove_limit(&mut self, caller: &Address, limit_time: u32) -> Result<()> {
        self.gate.ensure_bound(caller)?;
        self.engine.remove_limit(caller, limit_time)?;
        self.emit_removed(caller, limit_time);
        Ok(())
    }

    /// Remove several limits in order; all or nothing
    pub fn batch_remove_limits(&mut self, caller: &Address, limit_times: &[u32]) -> Result<()> {
        self.gate.ensure_bound(caller)?;
        self.engine.batch_remove_limits(caller, limit_times)?;
        for &limit_time in limit_times {
            self.emit_removed(caller, limit_time);
        }
        Ok(())
    }

    /// Limits configured on `compliance`, in table order
    pub fn list_limits(&self, compliance: &Address) -> Vec<TimeTransferLimit> {
        self.engine.limits(compliance).to_vec()
    }

    /// Counter of `identity` for the `limit_time` window on `compliance`
    pub fn query_counter(
        &self,
        compliance: &Address,
        identity: &Address,
        limit_time: u32,
    ) -> TransferCounter {
        self.engine.counter(compliance, identity, limit_time)
    }

    fn emit_updated(&self, compliance: &Address, limit: &TimeTransferLimit) {
        self.ctx.events.emit(ModuleEvent::TimeTransferLimitUpdated {
            compliance: *compliance,
            limit_time: limit.limit_time,
            limit_value: limit.limit_value,
        });
    }

    fn emit_removed(&self, compliance: &Address, limit_time: u32) {
        self.ctx.events.emit(ModuleEvent::TimeTransferLimitRemoved {
            compliance: *compliance,
            limit_time,
        });
    }
}

impl ComplianceModule for TimeTransfersLimitsModule {
    fn module_name(&self) -> &'static str {
        MODULE_NAME
    }

    fn is_composable(&self) -> bool {
        true
    }

    fn can_bind_to(&self, _compliance: &Address) -> bool {
        true
    }

    fn bind_compliance(&mut self, caller: &Address, compliance: Address) -> Result<()> {
        self.gate.bind(caller, compliance)
    }

    fn unbind_compliance(&mut self, caller: &Address, compliance: &Address) -> Result<()> {
        self.gate.unbind(caller, compliance)?;
        self.engine.clear_binding(compliance);
        Ok(())
    }

    fn is_compliance_bound(&self, compliance: &Address) -> bool {
        self.gate.is_bound(compliance)
    }

    fn check_transfer(&self, from: &Address, _to: &Address, amount: u128, compliance: &Address) -> bool {
        let exempt = self.ctx.exemptions.is_exempt(compliance, from);
        let identity = self.ctx.identities.identity(compliance, from);
        let now = self.ctx.clock.now();

        !self
            .engine
            .would_exceed(compliance, &identity, amount, now, exempt)
    }

    fn record_transfer(&mut self, caller: &Address, from: &Address, _to: &Address, amount: u128) -> Result<()> {
        self.gate.ensure_bound(caller)?;

        if !self.record_exempt_transfers && self.ctx.exemptions.is_exempt(caller, from) {
            debug!("Skipping counters for exempt sender {} on {}", from, caller);
            return Ok(());
        }

        let identity = self.ctx.identities.identity(caller, from);
        let now = self.ctx.clock.now();
        self.engine.record_transfer(caller, &identity, amount, now)
    }

    fn on_issue(&mut self, caller: &Address, _to: &Address, _amount: u128) -> Result<()> {
        self.gate.ensure_bound(caller)
    }

    fn on_redeem(&mut self, caller: &Address, _from: &Address, _amount: u128) -> Result<()> {
        self.gate.ensure_bound(caller)
    }
}

impl std::fmt::Debug for TimeTransfersLimitsModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeTransfersLimitsModule")
            .field("owner", &self.ownership.owner())
            .field("record_exempt_transfers", &self.record_exempt_transfers)
            .finish_non_exhaustive()
    }
}

/// Build an initialized module owned by `owner`
pub fn deploy(ctx: ModuleContext, owner: Address) -> Result<TimeTransfersLimitsModule> {
    let mut module = TimeTransfersLimitsModule::new(ctx);
    module.initialize(owner)?;
    info!("Deployed {} owned by {}", MODULE_NAME, owner);
    Ok(module)
}
