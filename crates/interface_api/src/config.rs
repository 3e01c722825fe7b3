//! API configuration

use rust_decimal::Decimal;
use serde::Deserialize;

use core_kernel::{Currency, Rate};
use domain_billing::BillingConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Ledger currency
    pub currency: Currency,
    /// VAT rate as a percentage (e.g., 5.0 for 5%)
    pub vat_rate_percent: Decimal,
    /// Service-charge rate as a percentage
    pub service_charge_percent: Decimal,
    /// Log level
    pub log_level: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            currency: Currency::USD,
            vat_rate_percent: Decimal::ZERO,
            service_charge_percent: Decimal::ZERO,
            log_level: "info".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Snapshot of the billing rates injected into the engine
    pub fn billing_config(&self) -> BillingConfig {
        BillingConfig::new(
            self.currency,
            Rate::from_percentage(self.vat_rate_percent),
            Rate::from_percentage(self.service_charge_percent),
        )
    }
}
