//! Exemption policy
//!
//! Transfers from the zero address (minting) and from agents of the token a
//! compliance governs are never throttled.

use crate::types::Address;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Decides whether a sender bypasses the limits of a binding
pub trait ExemptionPolicy: Send + Sync {
    /// Whether `account` holds the agent role on the token bound to `compliance`
    fn is_token_agent(&self, compliance: &Address, account: &Address) -> bool;

    /// Zero sender or token agent
    fn is_exempt(&self, compliance: &Address, sender: &Address) -> bool {
        sender.is_zero() || self.is_token_agent(compliance, sender)
    }
}

/// In-memory registry of token agents per compliance
#[derive(Debug, Default, Clone)]
pub struct TokenAgentRegistry {
    agents: HashMap<Address, HashSet<Address>>,
}

impl TokenAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_agent(&mut self, compliance: Address, agent: Address) {
        debug!("Added token agent {} on {}", agent, compliance);
        self.agents.entry(compliance).or_default().insert(agent);
    }

    pub fn remove_agent(&mut self, compliance: &Address, agent: &Address) {
        if let Some(agents) = self.agents.get_mut(compliance) {
            agents.remove(agent);
        }
    }
}

impl ExemptionPolicy for TokenAgentRegistry {
    fn is_token_agent(&self, compliance: &Address, account: &Address) -> bool {
        self.agents
            .get(compliance)
            .map(|agents| agents.contains(account))
            .unwrap_or(false)
    }
}
