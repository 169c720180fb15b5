//! TOML configuration loader with validation.
//!
//! One file with four tables: `[shared]` (required), `[engine]`,
//! `[parameters]` and `[simulation]` (all optional, defaulted).
//! Loading never partially applies: the whole bundle validates or the
//! binary refuses to start.

use std::path::Path;

use conveyor_common::config::{ConfigError, ConfigLoader, SharedConfig};
use conveyor_common::line::config::EngineConfig;
use conveyor_common::line::params::Parameters;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::sim::SimulationConfig;

/// Complete configuration bundle, ready for runtime use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Initial operator parameters.
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl ControlConfig {
    /// Run every table's validation rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.engine.validate()?;
        self.parameters
            .validate()
            .map_err(|e| ConfigError::ValidationError(format!("parameters: {e}")))?;
        self.simulation.validate()?;
        Ok(())
    }
}

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<ControlConfig, ConfigError> {
    let config = ControlConfig::load(path)?;
    config.validate()?;
    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Parse and validate configuration from an in-memory TOML string.
pub fn load_config_from_str(content: &str) -> Result<ControlConfig, ConfigError> {
    let config = ControlConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}
