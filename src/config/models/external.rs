//! External dependency probe configuration
//!
//! Probed services are declared via `HEALTH_CHECK_SERVICE_*` environment
//! variables, each holding a JSON object. When none are configured a small
//! built-in default set is installed so the external leaf is never empty.

use super::{default_expected_status, default_probe_timeout_ms};
use crate::utils::error::{HealthError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for a single external service probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalServiceConfig {
    /// Service name (unique key)
    pub name: String,
    /// Probe URL
    pub url: String,
    /// Service category, e.g. "payment", "data-feed"
    #[serde(default, rename = "type")]
    pub check_type: String,
    /// Probe timeout in milliseconds
    #[serde(default = "default_probe_timeout_ms", rename = "timeout")]
    pub timeout_ms: u64,
    /// Expected HTTP status code
    #[serde(default = "default_expected_status", rename = "expectedStatus")]
    pub expected_status: u16,
    /// Extra request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ExternalServiceConfig {
    /// Validate the probe configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(HealthError::Config(
                "external service name must not be empty".to_string(),
            ));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(HealthError::Config(format!(
                "external service '{}' has invalid url: {}",
                self.name, self.url
            )));
        }
        if self.timeout_ms == 0 {
            return Err(HealthError::Config(format!(
                "external service '{}' has zero timeout",
                self.name
            )));
        }
        Ok(())
    }
}

/// Load probe configurations from `HEALTH_CHECK_SERVICE_*` environment variables
///
/// Malformed entries are logged and skipped rather than failing startup; the
/// corresponding service simply never appears in the registry.
pub fn external_services_from_env() -> Result<Vec<ExternalServiceConfig>> {
    let mut services = Vec::new();

    for (key, value) in std::env::vars() {
        if !key.starts_with("HEALTH_CHECK_SERVICE_") {
            continue;
        }
        match serde_json::from_str::<ExternalServiceConfig>(&value) {
            Ok(config) => match config.validate() {
                Ok(()) => services.push(config),
                Err(e) => tracing::warn!("Ignoring invalid probe config {}: {}", key, e),
            },
            Err(e) => tracing::warn!("Ignoring malformed probe config {}: {}", key, e),
        }
    }

    if services.is_empty() {
        services = default_external_services();
    }

    Ok(services)
}

/// Built-in probe set used when nothing is configured
pub fn default_external_services() -> Vec<ExternalServiceConfig> {
    vec![
        ExternalServiceConfig {
            name: "payment-provider".to_string(),
            url: "https://api.payment-provider.example/status".to_string(),
            check_type: "payment".to_string(),
            timeout_ms: 5000,
            expected_status: 200,
            headers: HashMap::new(),
        },
        ExternalServiceConfig {
            name: "odds-feed".to_string(),
            url: "https://feed.odds.example/healthz".to_string(),
            check_type: "data-feed".to_string(),
            timeout_ms: 3000,
            expected_status: 200,
            headers: HashMap::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_json_shape() {
        let json = r#"{
            "name": "kyc",
            "url": "https://kyc.example/ping",
            "type": "compliance",
            "timeout": 2500,
            "expectedStatus": 204,
            "headers": {"x-api-key": "secret"}
        }"#;

        let config: ExternalServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "kyc");
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.expected_status, 204);
        assert_eq!(config.headers["x-api-key"], "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_applied_when_fields_missing() {
        let json = r#"{"name": "minimal", "url": "https://example.com/"}"#;
        let config: ExternalServiceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.expected_status, 200);
        assert!(config.headers.is_empty());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let config = ExternalServiceConfig {
            name: "bad".to_string(),
            url: "ftp://nope".to_string(),
            check_type: String::new(),
            timeout_ms: 1000,
            expected_status: 200,
            headers: HashMap::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_set_is_non_empty() {
        let defaults = default_external_services();
        assert!(!defaults.is_empty());
        for service in defaults {
            assert!(service.validate().is_ok());
        }
    }
}
