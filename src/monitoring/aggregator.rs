//! Root health aggregator
//!
//! Fans out to the seven leaf services concurrently, tolerates individual
//! failures, derives the overall status, and builds alerts and
//! recommendations. One aggregation call is terminal on every path: a leaf
//! failure becomes a critical placeholder, a blown outer deadline or a
//! top-level failure becomes the fixed fallback report.

use crate::config::MonitoringConfig;
use crate::monitoring::application::ApplicationHealthService;
use crate::monitoring::cache::CacheHealthService;
use crate::monitoring::database::{DatabaseHealthService, DatabaseProbe};
use crate::monitoring::external::ExternalServicesHealthService;
use crate::monitoring::performance::PerformanceHealthService;
use crate::monitoring::security::{SecurityHealthService, SecurityPosture};
use crate::monitoring::system::SystemHealthService;
use crate::monitoring::types::{
    Alert, AlertSeverity, ComponentHealth, ComprehensiveHealthReport, HealthStatus, HealthSummary,
    StatusSummary,
};
use crate::utils::error::{HealthError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Cheap liveness view combining only the system and database leaves
#[derive(Debug, Clone, Serialize)]
pub struct BasicHealth {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: u64,
    pub system: StatusSummary,
    pub database: StatusSummary,
}

/// Root health service composing all leaf checks
pub struct HealthService {
    pub system: Arc<SystemHealthService>,
    pub database: Arc<DatabaseHealthService>,
    pub external: Arc<ExternalServicesHealthService>,
    pub application: Arc<ApplicationHealthService>,
    pub performance: Arc<PerformanceHealthService>,
    pub cache: Arc<CacheHealthService>,
    pub security: Arc<SecurityHealthService>,
    deadline: Duration,
    cleanup_interval: Duration,
    started_at: Instant,
    active: Arc<AtomicBool>,
}

impl HealthService {
    /// Wire up all leaves from configuration and a database probe
    pub fn new(config: &MonitoringConfig, probe: Arc<dyn DatabaseProbe>) -> Self {
        // 256 MiB default budget until the cache layer reports real limits
        const DEFAULT_CACHE_BUDGET: u64 = 256 * 1024 * 1024;

        Self {
            system: Arc::new(SystemHealthService::new(config.system.clone())),
            database: Arc::new(DatabaseHealthService::new(probe, config.database.clone())),
            external: Arc::new(ExternalServicesHealthService::new(
                config.external_services.clone(),
                Duration::from_secs(config.probe_cache_ttl_secs),
            )),
            application: Arc::new(ApplicationHealthService::new(config.application.clone())),
            performance: Arc::new(PerformanceHealthService::new(config.performance.clone())),
            cache: Arc::new(CacheHealthService::new(
                config.cache.clone(),
                DEFAULT_CACHE_BUDGET,
            )),
            security: Arc::new(SecurityHealthService::new(
                config.security.clone(),
                SecurityPosture::from_env(),
            )),
            deadline: Duration::from_secs(config.aggregation_deadline_secs),
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs),
            started_at: Instant::now(),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Instrumentation hook for middleware without path context
    pub fn record_performance_metrics(&self, response_time_ms: f64, success: bool) {
        self.record_request("api", response_time_ms, success);
    }

    /// Record a completed request against both the performance and
    /// application leaves; called once per request by the HTTP middleware
    pub fn record_request(&self, endpoint: &str, response_time_ms: f64, success: bool) {
        self.performance.record_metrics(response_time_ms, success);
        self.application.record_request(endpoint, response_time_ms, success);
    }

    /// Process uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Full report over all seven leaves, never failing
    pub async fn get_comprehensive_health(&self) -> ComprehensiveHealthReport {
        debug!("running comprehensive health check");
        match tokio::time::timeout(self.deadline, self.fan_out()).await {
            Ok(components) => self.build_report(components),
            Err(_) => {
                error!(
                    "comprehensive health check exceeded {}s deadline",
                    self.deadline.as_secs()
                );
                self.fallback_report("aggregation deadline exceeded")
            }
        }
    }

    /// Issue all seven leaf checks concurrently and settle them all.
    /// A panicking leaf yields a critical placeholder, never an abort.
    async fn fan_out(&self) -> Vec<ComponentHealth> {
        let system = self.system.clone();
        let database = self.database.clone();
        let external = self.external.clone();
        let application = self.application.clone();
        let performance = self.performance.clone();
        let cache = self.cache.clone();
        let security = self.security.clone();

        let handles: Vec<(&'static str, JoinHandle<ComponentHealth>)> = vec![
            ("system", tokio::spawn(async move { system.check().await })),
            ("database", tokio::spawn(async move { database.check().await })),
            ("external_services", tokio::spawn(async move { external.check().await })),
            ("application", tokio::spawn(async move { application.check() })),
            ("performance", tokio::spawn(async move { performance.check() })),
            ("cache", tokio::spawn(async move { cache.check() })),
            ("security", tokio::spawn(async move { security.check() })),
        ];

        let mut components = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let component = match handle.await {
                Ok(component) => component,
                Err(e) => {
                    warn!("{} health check aborted: {}", name, e);
                    ComponentHealth::failed(name, e.to_string())
                }
            };
            components.push(component);
        }
        components
    }

    fn build_report(&self, components: Vec<ComponentHealth>) -> ComprehensiveHealthReport {
        let summary = HealthSummary::from_components(&components);
        let status = HealthStatus::combine(components.iter().map(|c| c.status));
        let alerts = Self::build_alerts(&components);
        let recommendations = Self::build_recommendations(&components);

        let services: HashMap<String, ComponentHealth> = components
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        ComprehensiveHealthReport {
            status,
            timestamp: chrono::Utc::now(),
            uptime_seconds: self.uptime_seconds(),
            summary,
            services,
            alerts,
            recommendations,
        }
    }

    /// One alert per non-healthy component
    fn build_alerts(components: &[ComponentHealth]) -> Vec<Alert> {
        components
            .iter()
            .filter(|c| c.status != HealthStatus::Healthy)
            .map(|c| Alert {
                id: uuid::Uuid::new_v4().to_string(),
                service: c.name.clone(),
                status: c.status,
                message: c.error.clone().unwrap_or_else(|| c.message.clone()),
                timestamp: chrono::Utc::now(),
                severity: Self::severity_for(c),
            })
            .collect()
    }

    /// Deterministic severity mapping; core infrastructure degrading is
    /// treated one tier above the rest
    fn severity_for(component: &ComponentHealth) -> AlertSeverity {
        match component.status {
            HealthStatus::Critical => AlertSeverity::Critical,
            HealthStatus::Degraded => match component.name.as_str() {
                "database" | "security" => AlertSeverity::High,
                _ => AlertSeverity::Medium,
            },
            HealthStatus::Unknown => AlertSeverity::Low,
            HealthStatus::Healthy => AlertSeverity::Low,
        }
    }

    /// Deterministic remediation strings per breached component
    fn build_recommendations(components: &[ComponentHealth]) -> Vec<String> {
        let mut recommendations = Vec::new();
        for component in components {
            if component.status == HealthStatus::Healthy {
                continue;
            }
            let suggestion = match component.name.as_str() {
                "system" => "Consider scaling compute resources or investigating runaway processes",
                "database" => {
                    if component.status == HealthStatus::Critical {
                        "Check database connectivity, credentials and failover state"
                    } else {
                        "Increase the database connection pool or investigate slow queries"
                    }
                }
                "external_services" => {
                    "Review third-party dependency status pages and failover configuration"
                }
                "application" => {
                    "Investigate elevated domain error rates and background task backlog"
                }
                "performance" => "Profile slow endpoints and consider caching hot paths",
                "cache" => "Increase cache memory or review the eviction policy",
                "security" => "Review authentication failures and apply pending security patches",
                _ => "Investigate the failing component",
            };
            recommendations.push(suggestion.to_string());
        }
        recommendations
    }

    /// Fixed report for when aggregation itself cannot run
    fn fallback_report(&self, reason: &str) -> ComprehensiveHealthReport {
        ComprehensiveHealthReport {
            status: HealthStatus::Critical,
            timestamp: chrono::Utc::now(),
            uptime_seconds: self.uptime_seconds(),
            summary: HealthSummary::default(),
            services: HashMap::new(),
            alerts: vec![Alert {
                id: uuid::Uuid::new_v4().to_string(),
                service: "Health Service".to_string(),
                status: HealthStatus::Critical,
                message: format!("health aggregation failed: {}", reason),
                timestamp: chrono::Utc::now(),
                severity: AlertSeverity::Critical,
            }],
            recommendations: vec![
                "Restart the health service or inspect its logs".to_string(),
                "Verify that monitored subsystems are reachable from this host".to_string(),
            ],
        }
    }

    /// Cheap probe-path view: system and database status only
    pub async fn get_basic_health(&self) -> BasicHealth {
        let (system, database) =
            tokio::join!(self.system.get_system_status(), self.database.get_database_status());

        BasicHealth {
            status: system.status.worst(database.status),
            timestamp: chrono::Utc::now(),
            uptime_seconds: self.uptime_seconds(),
            system,
            database,
        }
    }

    /// Check one named leaf; unknown names are an error
    pub async fn get_service_health(&self, name: &str) -> Result<ComponentHealth> {
        match name {
            "system" => Ok(self.system.check().await),
            "database" => Ok(self.database.check().await),
            "external" | "external_services" => Ok(self.external.check().await),
            "application" => Ok(self.application.check()),
            "performance" => Ok(self.performance.check()),
            "cache" => Ok(self.cache.check()),
            "security" => Ok(self.security.check()),
            other => Err(HealthError::NotFound(format!("no such service: {}", other))),
        }
    }

    /// Start the defensive buffer-cleanup task
    pub fn start(self: Arc<Self>) {
        if self.active.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(
            interval_secs = self.cleanup_interval.as_secs(),
            "starting health buffer cleanup task"
        );

        let service = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.cleanup_interval);
            // The first tick fires immediately; skip it
            interval.tick().await;
            loop {
                interval.tick().await;
                if !service.active.load(Ordering::Acquire) {
                    break;
                }
                debug!("pruning health buffers");
                service.external.prune();
                service.application.prune();
                service.performance.prune();
                service.security.prune();
            }
        });
    }

    /// Stop the cleanup task at the next tick
    pub fn stop(&self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::database::{
        MigrationStats, PoolStats, QueryStats, StorageStats,
    };
    use async_trait::async_trait;

    struct StubProbe {
        ping_fails: bool,
    }

    #[async_trait]
    impl DatabaseProbe for StubProbe {
        async fn ping(&self) -> Result<Duration> {
            if self.ping_fails {
                Err(HealthError::Probe("connection refused".to_string()))
            } else {
                Ok(Duration::from_millis(1))
            }
        }

        async fn pool_stats(&self) -> Result<PoolStats> {
            Ok(PoolStats {
                size: 4,
                max_size: 20,
                active: 2,
                idle: 2,
                waiting: 0,
            })
        }

        async fn query_stats(&self) -> Result<QueryStats> {
            Ok(QueryStats {
                avg_query_time_ms: 5.0,
                slow_queries: 0,
                cache_hit_rate: 99.0,
            })
        }

        async fn storage_stats(&self) -> Result<StorageStats> {
            Ok(StorageStats {
                database_size_bytes: 0,
                table_count: 0,
                index_count: 0,
            })
        }

        async fn migration_status(&self) -> Result<MigrationStats> {
            Ok(MigrationStats {
                applied: 1,
                pending: 0,
            })
        }
    }

    fn aggregator(ping_fails: bool) -> HealthService {
        let config = MonitoringConfig::default();
        HealthService::new(&config, Arc::new(StubProbe { ping_fails }))
    }

    #[tokio::test]
    async fn test_alert_count_matches_non_healthy_components() {
        let report = aggregator(false).get_comprehensive_health().await;
        let non_healthy = report
            .services
            .values()
            .filter(|c| c.status != HealthStatus::Healthy)
            .count();
        assert_eq!(report.alerts.len(), non_healthy);
        assert_eq!(report.summary.total, 7);
    }

    #[tokio::test]
    async fn test_overall_follows_worst_component() {
        let report = aggregator(false).get_comprehensive_health().await;
        let expected = HealthStatus::combine(report.services.values().map(|c| c.status));
        assert_eq!(report.status, expected);
    }

    #[tokio::test]
    async fn test_database_failure_is_isolated_and_critical() {
        let report = aggregator(true).get_comprehensive_health().await;

        assert_eq!(report.services["database"].status, HealthStatus::Critical);
        assert_eq!(report.status, HealthStatus::Critical);
        // The other six leaves still reported
        assert_eq!(report.summary.total, 7);

        let db_alerts: Vec<_> = report
            .alerts
            .iter()
            .filter(|a| a.service == "database")
            .collect();
        assert_eq!(db_alerts.len(), 1);
        assert_eq!(db_alerts[0].severity, AlertSeverity::Critical);
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("database connectivity")));
    }

    #[tokio::test]
    async fn test_basic_health_combines_system_and_database() {
        let basic = aggregator(true).get_basic_health().await;
        assert_eq!(basic.database.status, HealthStatus::Critical);
        assert_eq!(basic.status, HealthStatus::Critical);
    }

    #[tokio::test]
    async fn test_unknown_service_name_is_error() {
        let err = aggregator(false)
            .get_service_health("billing")
            .await
            .unwrap_err();
        assert!(matches!(err, HealthError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_named_dispatch_reaches_each_leaf() {
        let service = aggregator(false);
        for name in [
            "system",
            "database",
            "external",
            "application",
            "performance",
            "cache",
            "security",
        ] {
            let component = service.get_service_health(name).await.unwrap();
            assert!(!component.name.is_empty(), "no result for {}", name);
        }
    }

    #[tokio::test]
    async fn test_record_request_feeds_both_leaves() {
        let service = aggregator(false);
        service.record_request("/wagers/place", 42.0, true);
        service.record_performance_metrics(10.0, false);

        let perf = service.performance.get_performance_metrics();
        assert_eq!(perf.throughput.total_requests, 2);
        assert!(service
            .application
            .get_endpoint_metrics("/wagers/place")
            .is_some());
        assert!(service.application.get_endpoint_metrics("api").is_some());
    }

    #[tokio::test]
    async fn test_deadline_produces_fallback_report() {
        let mut config = MonitoringConfig::default();
        config.aggregation_deadline_secs = 0;
        let service = HealthService::new(&config, Arc::new(StubProbe { ping_fails: false }));

        let report = service.get_comprehensive_health().await;
        assert_eq!(report.status, HealthStatus::Critical);
        assert!(report.services.is_empty());
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].service, "Health Service");
        assert!(!report.recommendations.is_empty());
    }
}
