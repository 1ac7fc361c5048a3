//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;
use types::ConfigError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Mock chain behaviour
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Mock wallet behaviour
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Artificial delays of the mock services
    #[serde(default)]
    pub latency: LatencyConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Session storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Background scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// How long a full confirmation run takes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationSpeed {
    /// 2 seconds
    Fast,
    /// 5 seconds
    Normal,
    /// 10 seconds
    Slow,
}

/// Knobs of the mock chain, passed by value into each simulation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Confirmation speed
    #[serde(default = "default_speed", alias = "confirmation_speed")]
    pub confirmation_speed: ConfirmationSpeed,
    /// Scalar applied to the static gas price
    #[serde(default = "default_gas_multiplier", alias = "gas_multiplier")]
    pub gas_multiplier: f64,
    /// Jitter displayed prices
    #[serde(default = "default_true", alias = "volatility_enabled")]
    pub volatility_enabled: bool,
    /// Probability in [0, 1] that a payment is rejected
    #[serde(default = "default_failure_rate", alias = "failure_rate")]
    pub failure_rate: f64,
}

/// Partial update of [`SimulationConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfigUpdate {
    pub confirmation_speed: Option<ConfirmationSpeed>,
    pub gas_multiplier: Option<f64>,
    pub volatility_enabled: Option<bool>,
    pub failure_rate: Option<f64>,
}

/// Mock wallet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Address returned by every successful connection
    #[serde(default = "default_mock_address")]
    pub mock_address: String,
    /// Network name reported by the wallet
    #[serde(default = "default_network_name")]
    pub network_name: String,
    /// Probability that a connection attempt fails
    #[serde(default = "default_connect_failure_rate")]
    pub connect_failure_rate: f64,
    /// Probability that the user rejects a signature request
    #[serde(default = "default_sign_failure_rate")]
    pub sign_failure_rate: f64,
    /// Probability that a network switch fails
    #[serde(default = "default_switch_failure_rate")]
    pub switch_failure_rate: f64,
    /// University treasury address payments are sent to
    #[serde(default = "default_treasury_address")]
    pub treasury_address: String,
}

/// Artificial delays in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyConfig {
    #[serde(default = "default_gas_estimate_ms")]
    pub gas_estimate_ms: u64,
    #[serde(default = "default_initiate_payment_ms")]
    pub initiate_payment_ms: u64,
    #[serde(default = "default_wallet_connect_ms")]
    pub wallet_connect_ms: u64,
    #[serde(default = "default_wallet_sign_ms")]
    pub wallet_sign_ms: u64,
    #[serde(default = "default_switch_network_ms")]
    pub switch_network_ms: u64,
    #[serde(default = "default_receipt_upload_ms")]
    pub receipt_upload_ms: u64,
    #[serde(default = "default_receipt_verify_ms")]
    pub receipt_verify_ms: u64,
    #[serde(default = "default_login_ms")]
    pub login_ms: u64,
    #[serde(default = "default_register_ms")]
    pub register_ms: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the cached session user
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Enable request logging
    #[serde(default = "default_true")]
    pub request_logging: bool,
}

/// Background scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Interval between status reports in seconds
    #[serde(default = "default_status_interval")]
    pub status_interval_seconds: u64,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_speed() -> ConfirmationSpeed {
    ConfirmationSpeed::Normal
}

fn default_gas_multiplier() -> f64 {
    1.0
}

fn default_failure_rate() -> f64 {
    0.05
}

fn default_mock_address() -> String {
    "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string()
}

fn default_treasury_address() -> String {
    "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984".to_string()
}

fn default_network_name() -> String {
    "Ethereum Mainnet".to_string()
}

fn default_connect_failure_rate() -> f64 {
    0.1
}

fn default_sign_failure_rate() -> f64 {
    0.05
}

fn default_switch_failure_rate() -> f64 {
    0.1
}

fn default_gas_estimate_ms() -> u64 {
    1000
}

fn default_initiate_payment_ms() -> u64 {
    2000
}

fn default_wallet_connect_ms() -> u64 {
    1500
}

fn default_wallet_sign_ms() -> u64 {
    2000
}

fn default_switch_network_ms() -> u64 {
    1000
}

fn default_receipt_upload_ms() -> u64 {
    2000
}

fn default_receipt_verify_ms() -> u64 {
    1000
}

fn default_login_ms() -> u64 {
    1000
}

fn default_register_ms() -> u64 {
    1500
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_status_interval() -> u64 {
    60
}

impl ConfirmationSpeed {
    /// Wall-clock time for a full confirmation run
    pub fn total_duration(&self) -> Duration {
        match self {
            ConfirmationSpeed::Fast => Duration::from_millis(2000),
            ConfirmationSpeed::Normal => Duration::from_millis(5000),
            ConfirmationSpeed::Slow => Duration::from_millis(10000),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmationSpeed::Fast => "fast",
            ConfirmationSpeed::Normal => "normal",
            ConfirmationSpeed::Slow => "slow",
        }
    }
}

impl SimulationConfig {
    /// Duration of a full confirmation run at the configured speed
    pub fn confirmation_delay(&self) -> Duration {
        self.confirmation_speed.total_duration()
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.failure_rate.is_finite() || !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(ConfigError::ValidationError {
                field: "simulation.failure_rate".to_string(),
                message: format!("Failure rate must be within [0, 1], got {}", self.failure_rate),
            });
        }

        if !self.gas_multiplier.is_finite() || self.gas_multiplier <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: "simulation.gas_multiplier".to_string(),
                message: format!("Gas multiplier must be positive, got {}", self.gas_multiplier),
            });
        }

        Ok(())
    }

    /// Return a copy with the set fields of `update` applied, validated
    pub fn merged(&self, update: &SimulationConfigUpdate) -> Result<Self, ConfigError> {
        let merged = Self {
            confirmation_speed: update.confirmation_speed.unwrap_or(self.confirmation_speed),
            gas_multiplier: update.gas_multiplier.unwrap_or(self.gas_multiplier),
            volatility_enabled: update.volatility_enabled.unwrap_or(self.volatility_enabled),
            failure_rate: update.failure_rate.unwrap_or(self.failure_rate),
        };
        merged.validate()?;
        Ok(merged)
    }
}

impl LatencyConfig {
    /// All delays set to zero, for tests and demos
    pub fn instant() -> Self {
        Self {
            gas_estimate_ms: 0,
            initiate_payment_ms: 0,
            wallet_connect_ms: 0,
            wallet_sign_ms: 0,
            switch_network_ms: 0,
            receipt_upload_ms: 0,
            receipt_verify_ms: 0,
            login_ms: 0,
            register_ms: 0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            confirmation_speed: default_speed(),
            gas_multiplier: default_gas_multiplier(),
            volatility_enabled: default_true(),
            failure_rate: default_failure_rate(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            mock_address: default_mock_address(),
            network_name: default_network_name(),
            connect_failure_rate: default_connect_failure_rate(),
            sign_failure_rate: default_sign_failure_rate(),
            switch_failure_rate: default_switch_failure_rate(),
            treasury_address: default_treasury_address(),
        }
    }
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            gas_estimate_ms: default_gas_estimate_ms(),
            initiate_payment_ms: default_initiate_payment_ms(),
            wallet_connect_ms: default_wallet_connect_ms(),
            wallet_sign_ms: default_wallet_sign_ms(),
            switch_network_ms: default_switch_network_ms(),
            receipt_upload_ms: default_receipt_upload_ms(),
            receipt_verify_ms: default_receipt_verify_ms(),
            login_ms: default_login_ms(),
            register_ms: default_register_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            cors_enabled: default_true(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            request_logging: default_true(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            status_interval_seconds: default_status_interval(),
        }
    }
}
