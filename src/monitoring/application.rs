//! Application-level health checks
//!
//! Per-business-domain request counters, background-task queue state,
//! per-endpoint latency buffers and process memory. `record_request` is the
//! instrumentation entry point invoked by the HTTP middleware after each
//! completed request.

use crate::config::ApplicationThresholds;
use crate::monitoring::types::{ComponentHealth, HealthStatus};
use crate::monitoring::window::{mean, percentile, RollingWindow};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Response-time samples retained per endpoint
const ENDPOINT_WINDOW: usize = 100;
/// Endpoint map bound enforced by the cleanup task
const MAX_TRACKED_ENDPOINTS: usize = 256;

/// Business domains monitored by this deployment
const DOMAINS: [&str; 5] = ["wagering", "payouts", "matching", "accounts", "api"];

#[derive(Debug)]
struct DomainCounters {
    active_requests: u64,
    total_requests: u64,
    errors: u64,
    latencies: RollingWindow<f64>,
}

impl DomainCounters {
    fn new() -> Self {
        Self {
            active_requests: 0,
            total_requests: 0,
            errors: 0,
            latencies: RollingWindow::new(ENDPOINT_WINDOW),
        }
    }
}

#[derive(Debug)]
struct EndpointCounters {
    requests: u64,
    errors: u64,
    response_times: RollingWindow<f64>,
}

/// Background task queue snapshot, fed by the task runner collaborator
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TaskQueueStats {
    pub active: u64,
    pub queued: u64,
    pub completed: u64,
    pub failed: u64,
    pub avg_processing_time_ms: f64,
}

/// Health of one business domain
#[derive(Debug, Clone, Serialize)]
pub struct DomainHealth {
    pub status: HealthStatus,
    pub active_requests: u64,
    pub total_requests: u64,
    pub error_rate: f64,
    pub avg_latency_ms: f64,
}

/// Health across all business domains
#[derive(Debug, Clone, Serialize)]
pub struct DomainsHealth {
    pub status: HealthStatus,
    pub domains: HashMap<String, DomainHealth>,
}

/// Task processing health
#[derive(Debug, Clone, Serialize)]
pub struct TaskProcessingHealth {
    pub status: HealthStatus,
    pub queue: TaskQueueStats,
}

/// Metrics for one endpoint
#[derive(Debug, Clone, Serialize)]
pub struct EndpointMetrics {
    pub requests: u64,
    pub errors: u64,
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
    pub p95_response_time_ms: f64,
}

/// Health across tracked endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiHealth {
    pub status: HealthStatus,
    pub endpoints: HashMap<String, EndpointMetrics>,
}

/// Process memory health
#[derive(Debug, Clone, Serialize)]
pub struct ProcessMemoryHealth {
    pub status: HealthStatus,
    pub process_bytes: u64,
    pub system_total_bytes: u64,
    pub usage_percent: f64,
}

/// Full application health detail
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationHealth {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub domains: DomainsHealth,
    pub tasks: TaskProcessingHealth,
    pub api: ApiHealth,
    pub memory: ProcessMemoryHealth,
}

/// Application health service
pub struct ApplicationHealthService {
    thresholds: ApplicationThresholds,
    domains: RwLock<HashMap<String, DomainCounters>>,
    endpoints: RwLock<HashMap<String, EndpointCounters>>,
    tasks: RwLock<TaskQueueStats>,
}

impl ApplicationHealthService {
    /// Create the application leaf with the monitored domain set pre-seeded
    pub fn new(thresholds: ApplicationThresholds) -> Self {
        let mut domains = HashMap::new();
        for name in DOMAINS {
            domains.insert(name.to_string(), DomainCounters::new());
        }
        Self {
            thresholds,
            domains: RwLock::new(domains),
            endpoints: RwLock::new(HashMap::new()),
            tasks: RwLock::new(TaskQueueStats::default()),
        }
    }

    /// Map an endpoint path to its business domain
    fn domain_for(endpoint: &str) -> &'static str {
        let first = endpoint.trim_start_matches('/').split('/').next().unwrap_or("");
        match first {
            "wagers" | "wagering" | "bets" => "wagering",
            "payouts" | "withdrawals" => "payouts",
            "matching" | "p2p" => "matching",
            "accounts" | "users" => "accounts",
            _ => "api",
        }
    }

    /// Mark a request in flight; paired with `record_request` on completion
    pub fn request_started(&self, endpoint: &str) {
        let domain = Self::domain_for(endpoint);
        let mut domains = self.domains.write();
        if let Some(counters) = domains.get_mut(domain) {
            counters.active_requests += 1;
        }
    }

    /// Record a completed request against its endpoint and domain
    pub fn record_request(&self, endpoint: &str, response_time_ms: f64, success: bool) {
        {
            let mut endpoints = self.endpoints.write();
            let counters = endpoints
                .entry(endpoint.to_string())
                .or_insert_with(|| EndpointCounters {
                    requests: 0,
                    errors: 0,
                    response_times: RollingWindow::new(ENDPOINT_WINDOW),
                });
            counters.requests += 1;
            if !success {
                counters.errors += 1;
            }
            counters.response_times.push(response_time_ms);
        }

        let domain = Self::domain_for(endpoint);
        let mut domains = self.domains.write();
        if let Some(counters) = domains.get_mut(domain) {
            counters.active_requests = counters.active_requests.saturating_sub(1);
            counters.total_requests += 1;
            if !success {
                counters.errors += 1;
            }
            counters.latencies.push(response_time_ms);
        }
    }

    /// Replace the background task queue snapshot
    pub fn update_task_queue(&self, stats: TaskQueueStats) {
        *self.tasks.write() = stats;
    }

    /// Metrics for one endpoint, if tracked
    pub fn get_endpoint_metrics(&self, endpoint: &str) -> Option<EndpointMetrics> {
        let endpoints = self.endpoints.read();
        endpoints.get(endpoint).map(Self::endpoint_metrics)
    }

    fn endpoint_metrics(counters: &EndpointCounters) -> EndpointMetrics {
        let samples = counters.response_times.snapshot();
        let error_rate = if counters.requests > 0 {
            counters.errors as f64 / counters.requests as f64 * 100.0
        } else {
            0.0
        };
        EndpointMetrics {
            requests: counters.requests,
            errors: counters.errors,
            error_rate,
            avg_response_time_ms: mean(&samples),
            p95_response_time_ms: percentile(&samples, 95.0),
        }
    }

    fn classify_rates(&self, error_rate: f64, avg_latency_ms: f64) -> HealthStatus {
        let by_errors = HealthStatus::from_breach(
            error_rate,
            self.thresholds.domain_error_rate.warn,
            self.thresholds.domain_error_rate.critical,
        );
        let by_latency = HealthStatus::from_breach(
            avg_latency_ms,
            self.thresholds.domain_latency_ms.warn,
            self.thresholds.domain_latency_ms.critical,
        );
        by_errors.worst(by_latency)
    }

    /// Per-domain request and error health
    pub fn get_domain_health(&self) -> DomainsHealth {
        let domains = self.domains.read();
        let mut result = HashMap::new();
        for (name, counters) in domains.iter() {
            let error_rate = if counters.total_requests > 0 {
                counters.errors as f64 / counters.total_requests as f64 * 100.0
            } else {
                0.0
            };
            let avg_latency_ms = mean(&counters.latencies.snapshot());
            result.insert(
                name.clone(),
                DomainHealth {
                    status: self.classify_rates(error_rate, avg_latency_ms),
                    active_requests: counters.active_requests,
                    total_requests: counters.total_requests,
                    error_rate,
                    avg_latency_ms,
                },
            );
        }
        DomainsHealth {
            status: HealthStatus::combine(result.values().map(|d| d.status)),
            domains: result,
        }
    }

    /// Background task queue health
    pub fn get_task_processing_health(&self) -> TaskProcessingHealth {
        let queue = *self.tasks.read();
        let by_depth = HealthStatus::from_breach(
            queue.queued as f64,
            self.thresholds.task_queue_depth.warn,
            self.thresholds.task_queue_depth.critical,
        );
        let by_failures = HealthStatus::from_breach(
            queue.failed as f64,
            self.thresholds.task_failures.warn,
            self.thresholds.task_failures.critical,
        );
        TaskProcessingHealth {
            status: by_depth.worst(by_failures),
            queue,
        }
    }

    /// Per-endpoint health
    pub fn get_api_health(&self) -> ApiHealth {
        let endpoints = self.endpoints.read();
        let mut result = HashMap::new();
        let mut status = HealthStatus::Healthy;
        for (path, counters) in endpoints.iter() {
            let metrics = Self::endpoint_metrics(counters);
            status = status.worst(self.classify_rates(metrics.error_rate, metrics.avg_response_time_ms));
            result.insert(path.clone(), metrics);
        }
        ApiHealth {
            status,
            endpoints: result,
        }
    }

    /// Resident memory of this process against system total
    pub fn get_process_memory_health(&self) -> ProcessMemoryHealth {
        let zeroed = ProcessMemoryHealth {
            status: HealthStatus::Critical,
            process_bytes: 0,
            system_total_bytes: 0,
            usage_percent: 0.0,
        };

        let Ok(pid) = sysinfo::get_current_pid() else {
            return zeroed;
        };
        let mut sys = sysinfo::System::new();
        sys.refresh_memory();
        sys.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[pid]), true);

        let total = sys.total_memory();
        let Some(process) = sys.process(pid) else {
            return zeroed;
        };
        if total == 0 {
            return zeroed;
        }

        let process_bytes = process.memory();
        let usage_percent = process_bytes as f64 / total as f64 * 100.0;
        ProcessMemoryHealth {
            status: HealthStatus::from_breach(
                usage_percent,
                self.thresholds.process_memory_percent.warn,
                self.thresholds.process_memory_percent.critical,
            ),
            process_bytes,
            system_total_bytes: total,
            usage_percent,
        }
    }

    /// Full detail across domains, tasks, endpoints and memory
    pub fn get_application_health(&self) -> ApplicationHealth {
        let domains = self.get_domain_health();
        let tasks = self.get_task_processing_health();
        let api = self.get_api_health();
        let memory = self.get_process_memory_health();

        let status =
            HealthStatus::combine([domains.status, tasks.status, api.status, memory.status]);

        ApplicationHealth {
            status,
            timestamp: chrono::Utc::now(),
            domains,
            tasks,
            api,
            memory,
        }
    }

    /// Bound the endpoint map; windows are already bounded per entry
    pub fn prune(&self) {
        let mut endpoints = self.endpoints.write();
        if endpoints.len() <= MAX_TRACKED_ENDPOINTS {
            return;
        }
        debug!(tracked = endpoints.len(), "pruning endpoint metrics map");
        let mut by_traffic: Vec<(String, u64)> = endpoints
            .iter()
            .map(|(path, c)| (path.clone(), c.requests))
            .collect();
        by_traffic.sort_by_key(|(_, requests)| *requests);
        let excess = endpoints.len() - MAX_TRACKED_ENDPOINTS;
        for (path, _) in by_traffic.into_iter().take(excess) {
            endpoints.remove(&path);
        }
    }

    /// Aggregation entry point
    pub fn check(&self) -> ComponentHealth {
        let detail = self.get_application_health();
        let message = match detail.status {
            HealthStatus::Healthy => "Application domains healthy".to_string(),
            _ => format!("Application {}", detail.status),
        };
        ComponentHealth::new("application", detail.status, message, &detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ApplicationHealthService {
        ApplicationHealthService::new(ApplicationThresholds::default())
    }

    #[test]
    fn test_record_request_tracks_endpoint_and_domain() {
        let service = service();
        service.record_request("/wagers/place", 50.0, true);
        service.record_request("/wagers/place", 70.0, false);

        let metrics = service.get_endpoint_metrics("/wagers/place").unwrap();
        assert_eq!(metrics.requests, 2);
        assert_eq!(metrics.errors, 1);
        assert_eq!(metrics.error_rate, 50.0);
        assert_eq!(metrics.avg_response_time_ms, 60.0);

        let domains = service.get_domain_health();
        let wagering = &domains.domains["wagering"];
        assert_eq!(wagering.total_requests, 2);
    }

    #[test]
    fn test_unmatched_endpoint_falls_into_api_domain() {
        let service = service();
        service.record_request("/odds/today", 10.0, true);
        let domains = service.get_domain_health();
        assert_eq!(domains.domains["api"].total_requests, 1);
    }

    #[test]
    fn test_endpoint_window_is_bounded() {
        let service = service();
        for i in 0..500 {
            service.record_request("/accounts/me", i as f64, true);
        }
        let metrics = service.get_endpoint_metrics("/accounts/me").unwrap();
        assert_eq!(metrics.requests, 500);
        // Only the last 100 samples drive the percentile
        assert!(metrics.p95_response_time_ms >= 400.0);
    }

    #[test]
    fn test_domain_degrades_on_error_rate() {
        let service = service();
        for i in 0..100 {
            service.record_request("/payouts/run", 50.0, i % 20 != 0);
        }
        // 5% error rate breaches the 3% warn boundary
        let domains = service.get_domain_health();
        assert_eq!(domains.domains["payouts"].status, HealthStatus::Degraded);
    }

    #[test]
    fn test_domain_critical_on_latency() {
        let service = service();
        for _ in 0..10 {
            service.record_request("/matching/join", 800.0, true);
        }
        let domains = service.get_domain_health();
        assert_eq!(domains.domains["matching"].status, HealthStatus::Critical);
    }

    #[test]
    fn test_task_queue_classification() {
        let service = service();
        assert_eq!(
            service.get_task_processing_health().status,
            HealthStatus::Healthy
        );

        service.update_task_queue(TaskQueueStats {
            queued: 150,
            ..TaskQueueStats::default()
        });
        assert_eq!(
            service.get_task_processing_health().status,
            HealthStatus::Degraded
        );

        service.update_task_queue(TaskQueueStats {
            queued: 10,
            failed: 60,
            ..TaskQueueStats::default()
        });
        assert_eq!(
            service.get_task_processing_health().status,
            HealthStatus::Critical
        );
    }

    #[test]
    fn test_active_requests_gauge() {
        let service = service();
        service.request_started("/wagers/place");
        service.request_started("/wagers/place");
        assert_eq!(service.get_domain_health().domains["wagering"].active_requests, 2);

        service.record_request("/wagers/place", 10.0, true);
        assert_eq!(service.get_domain_health().domains["wagering"].active_requests, 1);
    }

    #[test]
    fn test_prune_bounds_endpoint_map() {
        let service = service();
        for i in 0..(MAX_TRACKED_ENDPOINTS + 50) {
            service.record_request(&format!("/odds/{}", i), 5.0, true);
        }
        service.prune();
        assert!(service.endpoints.read().len() <= MAX_TRACKED_ENDPOINTS);
    }
}
