//! Error types for limitguard

use thiserror::Error;

/// Main error type for limitguard operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LimitGuardError {
    // Caller gating errors
    #[error("only bound compliance can call")]
    Unauthorized,

    #[error("caller is not the owner")]
    NotOwner,

    #[error("new owner is the zero address")]
    InvalidOwner,

    #[error("module is already initialized")]
    AlreadyInitialized,

    // Limit registry errors
    #[error("limits array size exceeded for compliance {compliance} (max {max})")]
    CapacityExceeded { compliance: String, max: usize },

    #[error("limit time {limit_time} not found for compliance {compliance}")]
    WindowNotFound { compliance: String, limit_time: u32 },

    #[error("limit time must be a positive number of seconds")]
    InvalidWindowLength,

    // Counter errors
    #[error("counter overflow in {limit_time}s window")]
    CounterOverflow { limit_time: u32 },

    // Binding errors
    #[error("compliance already bound: {0}")]
    ComplianceAlreadyBound(String),

    #[error("compliance not bound: {0}")]
    ComplianceNotBound(String),

    // Input errors
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Storage errors
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<std::io::Error> for LimitGuardError {
    fn from(err: std::io::Error) -> Self {
        LimitGuardError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for LimitGuardError {
    fn from(err: serde_json::Error) -> Self {
        LimitGuardError::StorageError(format!("JSON error: {}", err))
    }
}

impl From<hex::FromHexError> for LimitGuardError {
    fn from(err: hex::FromHexError) -> Self {
        LimitGuardError::InvalidAddress(format!("Hex decode error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, LimitGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_message() {
        assert_eq!(
            LimitGuardError::Unauthorized.to_string(),
            "only bound compliance can call"
        );
    }

    #[test]
    fn test_hex_error_maps_to_invalid_address() {
        let err: LimitGuardError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, LimitGuardError::InvalidAddress(_)));
    }
}
