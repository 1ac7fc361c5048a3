//! Configuration validation utilities

use crate::schema::Config;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_simulation(config, &mut report);
        Self::validate_wallet(config, &mut report);
        Self::validate_latency(config, &mut report);
        Self::validate_server(config, &mut report);
        Self::validate_storage(config, &mut report);
        Self::validate_logging(config, &mut report);
        Self::validate_scheduler(config, &mut report);

        report
    }

    fn validate_simulation(config: &Config, report: &mut ValidationReport) {
        if let Err(types::ConfigError::ValidationError { field, message }) =
            config.simulation.validate()
        {
            report.add_error(&field, &message);
        }

        // The settings UI offers 0.5x..3x and 0%..20%
        if config.simulation.gas_multiplier > 3.0 {
            report.add_warning("simulation.gas_multiplier", "Gas multiplier above 3x");
        }

        if config.simulation.failure_rate > 0.2 {
            report.add_warning(
                "simulation.failure_rate",
                "Failure rate above 20%, most demo payments will fail",
            );
        }
    }

    fn validate_wallet(config: &Config, report: &mut ValidationReport) {
        if !types::utils::is_valid_address(&config.wallet.mock_address) {
            report.add_error("wallet.mock_address", "Mock wallet address is not a valid address");
        }

        if !types::utils::is_valid_address(&config.wallet.treasury_address) {
            report.add_error("wallet.treasury_address", "Treasury address is not a valid address");
        }

        let rates = [
            ("wallet.connect_failure_rate", config.wallet.connect_failure_rate),
            ("wallet.sign_failure_rate", config.wallet.sign_failure_rate),
            ("wallet.switch_failure_rate", config.wallet.switch_failure_rate),
        ];
        for (field, rate) in rates {
            if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
                report.add_error(field, &format!("Rate must be within [0, 1], got {}", rate));
            }
        }

        if config.wallet.network_name.is_empty() {
            report.add_error("wallet.network_name", "Network name cannot be empty");
        }
    }

    fn validate_latency(config: &Config, report: &mut ValidationReport) {
        let latency = &config.latency;
        let slowest = [
            latency.gas_estimate_ms,
            latency.initiate_payment_ms,
            latency.wallet_connect_ms,
            latency.wallet_sign_ms,
            latency.switch_network_ms,
            latency.receipt_upload_ms,
            latency.receipt_verify_ms,
            latency.login_ms,
            latency.register_ms,
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        if slowest >= config.server.request_timeout_seconds.saturating_mul(1000) {
            report.add_error(
                "latency",
                "A simulated delay is not shorter than the request timeout",
            );
        }
    }

    fn validate_server(config: &Config, report: &mut ValidationReport) {
        if config.server.port == 0 {
            report.add_error("server.port", "Server port cannot be 0");
        } else if config.server.port < 1024 {
            report.add_warning("server.port", "Server port is below 1024, may require elevated privileges");
        }

        if config.server.request_timeout_seconds == 0 {
            report.add_error("server.request_timeout_seconds", "Request timeout cannot be 0");
        } else if config.server.request_timeout_seconds > 300 {
            report.add_warning("server.request_timeout_seconds", "Request timeout is very high");
        }

        if config.server.host.is_empty() {
            report.add_error("server.host", "Server host cannot be empty");
        }
    }

    fn validate_storage(config: &Config, report: &mut ValidationReport) {
        if config.storage.data_dir.is_empty() {
            report.add_error("storage.data_dir", "Data directory cannot be empty");
        }
    }

    fn validate_logging(config: &Config, report: &mut ValidationReport) {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            report.add_error("logging.level", &format!("Invalid log level: {}. Valid levels: {:?}", config.logging.level, valid_levels));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            report.add_error("logging.format", &format!("Invalid log format: {}. Valid formats: {:?}", config.logging.format, valid_formats));
        }

        if config.logging.level == "trace" || config.logging.level == "debug" {
            report.add_warning("logging.level", "Debug/trace logging may impact performance in production");
        }
    }

    fn validate_scheduler(config: &Config, report: &mut ValidationReport) {
        if config.scheduler.status_interval_seconds == 0 {
            report.add_error("scheduler.status_interval_seconds", "Status interval cannot be 0");
        }
    }
}

/// Validation report containing errors and warnings
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A validation issue (error or warning)
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn summary(&self) -> String {
        format!("Validation: {} errors, {} warnings", self.errors.len(), self.warnings.len())
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let report = ConfigValidator::validate(&Config::default());
        assert!(report.is_valid(), "{:?}", report.errors);
    }

    #[test]
    fn test_bad_wallet_settings() {
        let mut config = Config::default();
        config.wallet.mock_address = "0x742d35Cc6643C0532925a3b8F26c6Cad1234567".to_string();
        config.wallet.sign_failure_rate = -0.1;

        let report = ConfigValidator::validate(&config);
        let fields: Vec<_> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"wallet.mock_address"));
        assert!(fields.contains(&"wallet.sign_failure_rate"));
    }

    #[test]
    fn test_high_failure_rate_warns() {
        let mut config = Config::default();
        config.simulation.failure_rate = 0.5;

        let report = ConfigValidator::validate(&config);
        assert!(report.is_valid());
        assert!(report.has_warnings());
    }

    #[test]
    fn test_latency_must_fit_request_timeout() {
        let mut config = Config::default();
        config.server.request_timeout_seconds = 1;

        let report = ConfigValidator::validate(&config);
        assert!(report.errors.iter().any(|e| e.field == "latency"));
    }
}
