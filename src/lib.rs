//! limitguard - rolling time-window transfer limits for token compliance
//!
//! A rule module for modular token compliance frameworks that:
//! - Keeps up to four time-window limits per compliance binding
//! - Tracks how much each identity transferred within every window
//! - Answers "would this transfer exceed a window?" without side effects
//! - Records executed transfers, resetting finished windows lazily
//!
//! Exempt senders (the zero address for minting and token agents) are never
//! throttled.

pub mod config;
pub mod errors;
pub mod identity;
pub mod module;
pub mod policy;
pub mod replay;
pub mod types;

pub use errors::{LimitGuardError, Result};
pub use module::{ComplianceModule, TimeTransfersLimitsModule};
pub use policy::{TimeTransferLimit, TransferCounter, MAX_LIMITS};
pub use types::Address;
