//! Caller gating
//!
//! Two independent gates:
//! - the owner gate for module administration (ownership transfer)
//! - the bound-compliance gate for limit configuration and transfer hooks

use crate::errors::{LimitGuardError, Result};
use crate::types::Address;
use std::collections::HashSet;
use tracing::{debug, info};

/// Single-owner administration with one-time initialization
#[derive(Debug, Default)]
pub struct Ownership {
    owner: Option<Address>,
}

impl Ownership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `caller` the owner. Only allowed once.
    pub fn initialize(&mut self, caller: Address) -> Result<()> {
        if self.owner.is_some() {
            return Err(LimitGuardError::AlreadyInitialized);
        }
        if caller.is_zero() {
            return Err(LimitGuardError::InvalidOwner);
        }

        self.owner = Some(caller);
        info!("Module initialized, owner {}", caller);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.owner.is_some()
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<()> {
        match self.owner {
            Some(owner) if owner == *caller => Ok(()),
            _ => Err(LimitGuardError::NotOwner),
        }
    }

    pub fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(LimitGuardError::InvalidOwner);
        }

        info!("Ownership transferred from {} to {}", caller, new_owner);
        self.owner = Some(new_owner);
        Ok(())
    }
}

/// Set of compliance contracts bound to the module
#[derive(Debug, Default)]
pub struct ComplianceGate {
    bound: HashSet<Address>,
}

impl ComplianceGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A compliance binds itself; nobody else can bind it
    pub fn bind(&mut self, caller: &Address, compliance: Address) -> Result<()> {
        if *caller != compliance || compliance.is_zero() {
            return Err(LimitGuardError::Unauthorized);
        }
        if !self.bound.insert(compliance) {
            return Err(LimitGuardError::ComplianceAlreadyBound(compliance.to_string()));
        }

        info!("Compliance bound: {}", compliance);
        Ok(())
    }

    /// A compliance unbinds itself; nobody else can unbind it
    pub fn unbind(&mut self, caller: &Address, compliance: &Address) -> Result<()> {
        if caller != compliance {
            return Err(LimitGuardError::Unauthorized);
        }
        if !self.bound.remove(compliance) {
            return Err(LimitGuardError::ComplianceNotBound(compliance.to_string()));
        }

        info!("Compliance unbound: {}", compliance);
        Ok(())
    }

    pub fn is_bound(&self, compliance: &Address) -> bool {
        self.bound.contains(compliance)
    }

    /// Reject callers that are not a bound compliance
    pub fn ensure_bound(&self, caller: &Address) -> Result<()> {
        if self.is_bound(caller) {
            Ok(())
        } else {
            debug!("Rejected call from unbound caller {}", caller);
            Err(LimitGuardError::Unauthorized)
        }
    }
}
