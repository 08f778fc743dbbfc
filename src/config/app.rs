//! Application configuration structures.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sink::DEFAULT_SINK_CAPACITY;

use super::module::ModuleConfig;
use super::error::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Default timeout for a single provider command (30 seconds).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the module used when none is requested.
pub const DEFAULT_MODULE: &str = "default";

fn default_command_timeout() -> Duration {
    DEFAULT_COMMAND_TIMEOUT
}

fn default_sink_capacity() -> usize {
    DEFAULT_SINK_CAPACITY
}

// =============================================================================
// Harness Configuration
// =============================================================================

/// Settings for the test runner itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Timeout applied to every external command (default: 30s).
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Bounded metric sink capacity (default: 100).
    #[serde(default = "default_sink_capacity")]
    pub sink_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Runner settings.
    #[serde(default)]
    pub harness: HarnessConfig,

    /// Named target modules.
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        for module in config.modules.values_mut() {
            module.expand_env();
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns the first out-of-range harness setting or invalid module.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.harness.sink_capacity == 0 {
            return Err(ConfigError::Harness("sink_capacity must be positive"));
        }

        if self.harness.command_timeout.is_zero() {
            return Err(ConfigError::Harness("command_timeout must be positive"));
        }

        for (name, module) in &self.modules {
            module.validate(name)?;
        }

        Ok(())
    }

    /// Look up a module by name.
    ///
    /// The `default` module always exists, falling back to built-in defaults.
    pub fn module(&self, name: &str) -> Result<ModuleConfig, ConfigError> {
        match self.modules.get(name) {
            Some(module) => Ok(module.clone()),
            None if name == DEFAULT_MODULE => Ok(ModuleConfig::default()),
            None => Err(ConfigError::UnknownModule(name.to_string())),
        }
    }
}
