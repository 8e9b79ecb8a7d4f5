//! Configuration management for the health service
//!
//! This module handles loading and validation of all service configuration.

pub mod models;

pub use models::*;

use crate::utils::error::{HealthError, Result};
use tracing::{debug, info};

/// Main configuration struct for the health service
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database connection configuration
    pub database: DatabaseConfig,
    /// Monitoring configuration (thresholds, intervals, external probes)
    pub monitoring: MonitoringConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env(),
            monitoring: MonitoringConfig::from_env()?,
        };

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(HealthError::Config("server port must be non-zero".to_string()));
        }
        for service in &self.monitoring.external_services {
            service.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
    }
}
