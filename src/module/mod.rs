//! Compliance module surface
//!
//! Provides:
//! - The `ComplianceModule` hook set a compliance framework dispatches to
//! - Caller gating (owner and bound compliance)
//! - Clock, exemption and event ports
//! - The time transfers limits module itself

pub mod auth;
pub mod clock;
pub mod events;
pub mod exemption;
pub mod limits;

use crate::errors::Result;
use crate::types::Address;

pub use auth::{ComplianceGate, Ownership};
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventLog, EventSink, ModuleEvent};
pub use exemption::{ExemptionPolicy, TokenAgentRegistry};
pub use limits::{deploy, ModuleContext, TimeTransfersLimitsModule, MODULE_NAME};

/// Hooks shared by every rule module of a modular compliance.
///
/// Mutating hooks take the caller so the module can check it is a bound
/// compliance. `check_transfer` is a pure predicate and takes the compliance
/// to evaluate against instead.
pub trait ComplianceModule {
    fn module_name(&self) -> &'static str;

    /// Whether the module can be combined with other modules on one compliance
    fn is_composable(&self) -> bool;

    /// Whether `compliance` may bind this module in its current state
    fn can_bind_to(&self, compliance: &Address) -> bool;

    fn bind_compliance(&mut self, caller: &Address, compliance: Address) -> Result<()>;

    fn unbind_compliance(&mut self, caller: &Address, compliance: &Address) -> Result<()>;

    fn is_compliance_bound(&self, compliance: &Address) -> bool;

    /// `true` when the transfer is allowed
    fn check_transfer(&self, from: &Address, to: &Address, amount: u128, compliance: &Address) -> bool;

    /// Called after a transfer was executed
    fn record_transfer(&mut self, caller: &Address, from: &Address, to: &Address, amount: u128) -> Result<()>;

    fn on_issue(&mut self, caller: &Address, to: &Address, amount: u128) -> Result<()>;

    fn on_redeem(&mut self, caller: &Address, from: &Address, amount: u128) -> Result<()>;
}
