//! Configuration management
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use sapledger::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Job tables live under: {}", config.paths.csv_dir.display());
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `SAPLEDGER__<section>__<key>`
//!
//! Examples:
//! - `SAPLEDGER__PATHS__CSV_DIR=/var/lib/sapledger/csv`
//! - `SAPLEDGER__WATCH__POLL_INTERVAL_MS=250`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/sapledger.toml`.
//! This can be overridden using the `SAPLEDGER_CONFIG` environment variable.
//!
//! Components receive the resolved `Config` (or a section of it) as an
//! explicit value; nothing reads configuration from module-level state.

mod models;
mod sources;

pub use models::{Config, PathsConfig, PurgeConfig, TableKind, TablesConfig, WatchConfig};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`SAPLEDGER__*`)
    /// 2. TOML file (default: `config/sapledger.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.watch.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "watch.poll_interval_ms must be greater than zero".to_string(),
        ));
    }
    if config.watch.suffix.is_empty() {
        return Err(ConfigError::ValidationError(
            "watch.suffix must not be empty".to_string(),
        ));
    }
    Ok(())
}
