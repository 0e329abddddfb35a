//! Identity resolution
//!
//! Counters are kept per identity rather than per account, so several
//! wallets of the same investor share one budget. The resolver is provided by
//! the host framework; [`IdentityRegistry`] is an in-memory implementation.

use crate::types::Address;
use std::collections::HashMap;
use tracing::debug;

/// Maps an account to the identity it belongs to within a binding
pub trait IdentityResolver: Send + Sync {
    /// Identity of `account` for `compliance`.
    ///
    /// Unregistered accounts resolve to [`Address::ZERO`].
    fn identity(&self, compliance: &Address, account: &Address) -> Address;
}

/// In-memory identity registry
#[derive(Debug, Default, Clone)]
pub struct IdentityRegistry {
    /// (compliance, account) -> identity
    identities: HashMap<(Address, Address), Address>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `account` as belonging to `identity` under `compliance`
    pub fn register(&mut self, compliance: Address, account: Address, identity: Address) {
        debug!(
            "Registered {} as identity {} on {}",
            account, identity, compliance
        );
        self.identities.insert((compliance, account), identity);
    }

    pub fn unregister(&mut self, compliance: &Address, account: &Address) {
        self.identities.remove(&(*compliance, *account));
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

impl IdentityResolver for IdentityRegistry {
    fn identity(&self, compliance: &Address, account: &Address) -> Address {
        self.identities
            .get(&(*compliance, *account))
            .copied()
            .unwrap_or(Address::ZERO)
    }
}
