//! Monitoring configuration

use super::external::{external_services_from_env, ExternalServiceConfig};
use super::thresholds::*;
use super::default_probe_cache_ttl_secs;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// Monitoring configuration: thresholds, intervals and external probes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// System leaf thresholds
    #[serde(default)]
    pub system: SystemThresholds,
    /// Database leaf thresholds
    #[serde(default)]
    pub database: DatabaseThresholds,
    /// Application leaf thresholds
    #[serde(default)]
    pub application: ApplicationThresholds,
    /// Performance leaf thresholds
    #[serde(default)]
    pub performance: PerformanceThresholds,
    /// Cache leaf thresholds
    #[serde(default)]
    pub cache: CacheThresholds,
    /// Security leaf thresholds
    #[serde(default)]
    pub security: SecurityThresholds,
    /// Configured external service probes
    #[serde(default)]
    pub external_services: Vec<ExternalServiceConfig>,
    /// TTL for cached external probe results, in seconds
    #[serde(default = "default_probe_cache_ttl_secs")]
    pub probe_cache_ttl_secs: u64,
    /// Outer deadline for the comprehensive fan-out, in seconds
    #[serde(default = "default_aggregation_deadline_secs")]
    pub aggregation_deadline_secs: u64,
    /// Interval of the defensive buffer-cleanup task, in seconds
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Default outer fan-out deadline in seconds
pub fn default_aggregation_deadline_secs() -> u64 {
    10
}

/// Default cleanup interval in seconds (5 minutes)
pub fn default_cleanup_interval_secs() -> u64 {
    300
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            system: SystemThresholds::default(),
            database: DatabaseThresholds::default(),
            application: ApplicationThresholds::default(),
            performance: PerformanceThresholds::default(),
            cache: CacheThresholds::default(),
            security: SecurityThresholds::default(),
            external_services: Vec::new(),
            probe_cache_ttl_secs: default_probe_cache_ttl_secs(),
            aggregation_deadline_secs: default_aggregation_deadline_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl MonitoringConfig {
    /// Load monitoring configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.external_services = external_services_from_env()?;

        if let Ok(ttl) = std::env::var("HEALTH_PROBE_CACHE_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                config.probe_cache_ttl_secs = ttl;
            }
        }
        if let Ok(deadline) = std::env::var("HEALTH_AGGREGATION_DEADLINE_SECS") {
            if let Ok(deadline) = deadline.parse() {
                config.aggregation_deadline_secs = deadline;
            }
        }

        Ok(config)
    }
}
