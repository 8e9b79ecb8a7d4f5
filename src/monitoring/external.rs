//! External dependency health probes
//!
//! Each configured third-party service is probed with a bounded HTTP GET and
//! classified by status match and elapsed time. Results are cached per
//! service for a TTL window; concurrent callers for the same service
//! coalesce onto one in-flight probe instead of issuing duplicates.

use crate::config::ExternalServiceConfig;
use crate::monitoring::types::{ComponentHealth, HealthStatus};
use crate::utils::error::{HealthError, Result};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Elapsed-time fraction of the timeout above which a correct response is
/// still considered slow
const SLOW_FRACTION: f64 = 0.8;

/// Outcome of probing one external service
#[derive(Debug, Clone, Serialize)]
pub struct ServiceProbeResult {
    pub name: String,
    pub check_type: String,
    pub status: HealthStatus,
    pub status_code: Option<u16>,
    pub response_time_ms: f64,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(skip)]
    checked_at: Instant,
}

/// Tally across all probed services
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExternalSummary {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub critical: usize,
    pub unknown: usize,
}

/// Combined view over all external services
#[derive(Debug, Clone, Serialize)]
pub struct ExternalServicesHealth {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub summary: ExternalSummary,
    pub services: Vec<ServiceProbeResult>,
}

struct ServiceEntry {
    config: parking_lot::RwLock<ExternalServiceConfig>,
    /// Cached result; the lock is held across the HTTP probe so concurrent
    /// callers within the TTL window coalesce (single flight)
    slot: tokio::sync::Mutex<Option<ServiceProbeResult>>,
}

/// External dependency health service
pub struct ExternalServicesHealthService {
    client: reqwest::Client,
    ttl: Duration,
    services: DashMap<String, Arc<ServiceEntry>>,
}

impl ExternalServicesHealthService {
    /// Create the external leaf from configured probes
    pub fn new(configs: Vec<ExternalServiceConfig>, ttl: Duration) -> Self {
        let services = DashMap::new();
        for config in configs {
            services.insert(
                config.name.clone(),
                Arc::new(ServiceEntry {
                    config: parking_lot::RwLock::new(config),
                    slot: tokio::sync::Mutex::new(None),
                }),
            );
        }
        Self {
            client: reqwest::Client::new(),
            ttl,
            services,
        }
    }

    /// Register a probe at runtime
    pub fn add_service(&self, config: ExternalServiceConfig) -> Result<()> {
        config.validate()?;
        self.services.insert(
            config.name.clone(),
            Arc::new(ServiceEntry {
                config: parking_lot::RwLock::new(config),
                slot: tokio::sync::Mutex::new(None),
            }),
        );
        Ok(())
    }

    /// Remove a probe; unknown names are an error
    pub fn remove_service(&self, name: &str) -> Result<()> {
        self.services
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| HealthError::NotFound(format!("no such external service: {}", name)))
    }

    /// Configured service names
    pub fn service_names(&self) -> Vec<String> {
        self.services.iter().map(|e| e.key().clone()).collect()
    }

    /// Health of one service, served from cache when fresh
    pub async fn get_service_health(&self, name: &str) -> Result<ServiceProbeResult> {
        let entry = self
            .services
            .get(name)
            .map(|e| e.value().clone())
            .ok_or_else(|| HealthError::NotFound(format!("no such external service: {}", name)))?;

        let mut slot = entry.slot.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.checked_at.elapsed() < self.ttl {
                debug!(service = name, "serving probe result from cache");
                return Ok(cached.clone());
            }
        }

        let config = entry.config.read().clone();
        let result = self.probe(&config).await;
        *slot = Some(result.clone());
        Ok(result)
    }

    /// Probe every configured service concurrently and tally the results
    pub async fn get_all_services_health(&self) -> ExternalServicesHealth {
        let names = self.service_names();
        let probes = names.iter().map(|name| self.get_service_health(name));
        let results: Vec<ServiceProbeResult> = futures::future::join_all(probes)
            .await
            .into_iter()
            .flatten()
            .collect();

        let mut summary = ExternalSummary {
            total: results.len(),
            ..ExternalSummary::default()
        };
        for result in &results {
            match result.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Critical => summary.critical += 1,
                HealthStatus::Unknown => summary.unknown += 1,
            }
        }

        // Unknown counts against readiness here: a service we cannot
        // classify is treated like a degraded one
        let status = if summary.critical > 0 {
            HealthStatus::Critical
        } else if summary.degraded > 0 || summary.unknown > 0 {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        ExternalServicesHealth {
            status,
            timestamp: chrono::Utc::now(),
            summary,
            services: results,
        }
    }

    /// Issue one bounded GET and classify the outcome
    async fn probe(&self, config: &ExternalServiceConfig) -> ServiceProbeResult {
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut request = self.client.get(&config.url).timeout(timeout);
        for (key, value) in &config.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let started = Instant::now();
        let outcome = request.send().await;
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        let (status, status_code, message) = match outcome {
            Ok(response) => {
                let code = response.status().as_u16();
                if code == config.expected_status {
                    if elapsed_ms < config.timeout_ms as f64 * SLOW_FRACTION {
                        (
                            HealthStatus::Healthy,
                            Some(code),
                            format!("responded {} in {:.0}ms", code, elapsed_ms),
                        )
                    } else {
                        (
                            HealthStatus::Degraded,
                            Some(code),
                            format!("slow response: {:.0}ms of {}ms budget", elapsed_ms, config.timeout_ms),
                        )
                    }
                } else {
                    (
                        HealthStatus::Critical,
                        Some(code),
                        format!("unexpected status {} (wanted {})", code, config.expected_status),
                    )
                }
            }
            Err(e) if e.is_timeout() => {
                warn!(service = %config.name, "probe timed out after {}ms", config.timeout_ms);
                (
                    HealthStatus::Critical,
                    None,
                    format!("timed out after {}ms", config.timeout_ms),
                )
            }
            Err(e) if e.is_builder() => (
                // Malformed configuration (for example a bad header name)
                // is surfaced but excluded from strict pass/fail
                HealthStatus::Unknown,
                None,
                format!("invalid probe configuration: {}", e),
            ),
            Err(e) => (
                HealthStatus::Critical,
                None,
                format!("connection failed: {}", e),
            ),
        };

        ServiceProbeResult {
            name: config.name.clone(),
            check_type: config.check_type.clone(),
            status,
            status_code,
            response_time_ms: elapsed_ms,
            message,
            timestamp: chrono::Utc::now(),
            checked_at: started,
        }
    }

    /// Drop cached results past their TTL; used by the cleanup task
    pub fn prune(&self) {
        for entry in self.services.iter() {
            if let Ok(mut slot) = entry.value().slot.try_lock() {
                if let Some(cached) = slot.as_ref() {
                    if cached.checked_at.elapsed() >= self.ttl {
                        *slot = None;
                    }
                }
            }
        }
    }

    /// Aggregation entry point
    pub async fn check(&self) -> ComponentHealth {
        let detail = self.get_all_services_health().await;
        let message = match detail.status {
            HealthStatus::Healthy => {
                format!("{} external services reachable", detail.summary.total)
            }
            _ => format!(
                "{} of {} external services unhealthy",
                detail.summary.critical + detail.summary.degraded + detail.summary.unknown,
                detail.summary.total
            ),
        };
        ComponentHealth::new("external_services", detail.status, message, &detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(name: &str, url: &str) -> ExternalServiceConfig {
        ExternalServiceConfig {
            name: name.to_string(),
            url: url.to_string(),
            check_type: "test".to_string(),
            timeout_ms: 1000,
            expected_status: 200,
            headers: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let service = ExternalServicesHealthService::new(vec![], Duration::from_secs(30));
        let err = service.get_service_health("nope").await.unwrap_err();
        assert!(matches!(err, HealthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_add_and_remove_service() {
        let service = ExternalServicesHealthService::new(vec![], Duration::from_secs(30));
        service
            .add_service(config("probe", "http://127.0.0.1:1/"))
            .unwrap();
        assert_eq!(service.service_names(), vec!["probe".to_string()]);

        service.remove_service("probe").unwrap();
        assert!(service.remove_service("probe").is_err());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_on_add() {
        let service = ExternalServicesHealthService::new(vec![], Duration::from_secs(30));
        let mut bad = config("bad", "not-a-url");
        bad.url = "not-a-url".to_string();
        assert!(service.add_service(bad).is_err());
    }

    #[tokio::test]
    async fn test_connection_refused_is_critical() {
        // Nothing listens on port 1
        let service = ExternalServicesHealthService::new(
            vec![config("dead", "http://127.0.0.1:1/healthz")],
            Duration::from_secs(30),
        );
        let result = service.get_service_health("dead").await.unwrap();
        assert_eq!(result.status, HealthStatus::Critical);
        assert!(result.status_code.is_none());
    }

    #[tokio::test]
    async fn test_empty_registry_aggregates_healthy() {
        let service = ExternalServicesHealthService::new(vec![], Duration::from_secs(30));
        let all = service.get_all_services_health().await;
        assert_eq!(all.status, HealthStatus::Healthy);
        assert_eq!(all.summary.total, 0);
    }
}
