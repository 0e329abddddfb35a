//! Configuration management for limitguard
//!
//! Supports loading configuration from:
//! - Built-in defaults
//! - Config file (limitguard.toml, or the path given with --config)
//! - Environment variables (LIMITGUARD_*)

use crate::errors::{LimitGuardError, Result};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Module configuration
    pub module: ModuleConfig,

    /// Replay configuration
    pub replay: ReplayConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Module configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Address the module is initialized with as owner
    pub owner: String,

    /// Record counters for exempt senders too
    pub record_exempt_transfers: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            owner: "0x00000000000000000000000000000000000000de".to_string(),
            record_exempt_transfers: false,
        }
    }
}

/// Replay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Scenario file to replay when none is given on the command line
    pub scenario_path: Option<PathBuf>,

    /// Output format (pretty, json)
    pub output: String,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            scenario_path: None,
            output: "pretty".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const FORMATS: &[&str] = &["json", "pretty"];

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = config::Config::try_from(&Config::default())
            .map_err(|e| LimitGuardError::ConfigError(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(Path::new(path)).required(true));
        } else {
            builder = builder.add_source(config::File::with_name("limitguard").required(false));
        }

        // Load from environment (LIMITGUARD_LOGGING__LEVEL, etc.)
        builder = builder.add_source(
            config::Environment::with_prefix("LIMITGUARD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| LimitGuardError::ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| LimitGuardError::ConfigError(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let owner = self.owner()?;
        if owner.is_zero() {
            return Err(LimitGuardError::ConfigError(
                "module.owner must not be the zero address".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(LimitGuardError::ConfigError(format!(
                "Unknown log level: {}",
                self.logging.level
            )));
        }

        if !FORMATS.contains(&self.logging.format.as_str()) {
            return Err(LimitGuardError::ConfigError(format!(
                "Unknown log format: {}",
                self.logging.format
            )));
        }

        if !FORMATS.contains(&self.replay.output.as_str()) {
            return Err(LimitGuardError::ConfigError(format!(
                "Unknown replay output: {}",
                self.replay.output
            )));
        }

        Ok(())
    }

    /// The configured owner address
    pub fn owner(&self) -> Result<Address> {
        Address::parse(&self.module.owner)
            .map_err(|e| LimitGuardError::ConfigError(format!("module.owner: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.module.record_exempt_transfers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_owner_rejected() {
        let mut config = Config::default();
        config.module.owner = "0x0000000000000000000000000000000000000000".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            LimitGuardError::ConfigError(_)
        ));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limitguard.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[module]\nrecord_exempt_transfers = true\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert!(config.module.record_exempt_transfers);
        assert_eq!(config.logging.level, "debug");
        // Untouched sections keep their defaults
        assert_eq!(config.replay.output, "pretty");
    }
}
