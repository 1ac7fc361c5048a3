//! Configuration loader implementation

use crate::schema::Config;
use crate::validation::ConfigValidator;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use std::path::Path;
use types::ConfigError;

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "TUITION_PORTAL_";

/// Configuration loader that handles YAML files and environment variables
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from an existing file and environment variables
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(ConfigError::FileNotFound {
                path: config_path.display().to_string(),
            }
            .into());
        }

        Self::load_with_defaults(config_path)
    }

    /// Load configuration, falling back to the built-in defaults for every
    /// missing key; a missing file is not an error
    pub fn load_with_defaults<P: AsRef<Path>>(config_path: P) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Yaml::file(config_path.as_ref()))
            // e.g. TUITION_PORTAL_SIMULATION__FAILURE_RATE=0.2
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to parse configuration")?;

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from string (for testing)
    pub fn load_from_str(yaml_content: &str) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Yaml::string(yaml_content))
            .extract()
            .context("Failed to parse configuration from string")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Fail on the first validation error
    fn validate(config: &Config) -> Result<()> {
        let report = ConfigValidator::validate(config);
        if let Some(issue) = report.errors.first() {
            return Err(ConfigError::ValidationError {
                field: issue.field.clone(),
                message: issue.message.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Get default configuration
    pub fn default() -> Config {
        Config::default()
    }

    /// Create example configuration file
    pub fn create_example<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let yaml_content = serde_yaml::to_string(&config)
            .context("Failed to serialize default configuration")?;

        std::fs::write(path.as_ref(), yaml_content)
            .context("Failed to write example configuration file")?;

        Ok(())
    }
}
