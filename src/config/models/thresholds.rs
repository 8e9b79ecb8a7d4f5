//! Classification thresholds for each health component
//!
//! All warn/critical boundaries live here as plain configuration structs,
//! constructed once and passed into the owning service. Values may be
//! overridden per deployment; defaults match production policy.

use serde::{Deserialize, Serialize};

/// A warn/critical boundary pair for a single metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Boundary {
    /// Degraded above (or below, for lower-is-worse metrics) this value
    pub warn: f64,
    /// Critical beyond this value
    pub critical: f64,
}

impl Boundary {
    /// Construct a boundary pair
    pub const fn new(warn: f64, critical: f64) -> Self {
        Self { warn, critical }
    }
}

/// Thresholds for OS-level resource checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemThresholds {
    /// CPU usage percent
    pub cpu_percent: Boundary,
    /// Memory usage percent
    pub memory_percent: Boundary,
    /// Disk usage percent (per mount point)
    pub disk_percent: Boundary,
    /// Load average as a multiple of core count
    pub load_multiplier: Boundary,
}

impl Default for SystemThresholds {
    fn default() -> Self {
        Self {
            cpu_percent: Boundary::new(70.0, 90.0),
            memory_percent: Boundary::new(75.0, 90.0),
            disk_percent: Boundary::new(75.0, 90.0),
            load_multiplier: Boundary::new(1.5, 2.0),
        }
    }
}

/// Thresholds for database pool and performance checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseThresholds {
    /// Waiting clients above which the pool is degraded
    pub max_waiting_clients: u32,
    /// Fraction of max pool size above which the pool is degraded
    pub pool_saturation: f64,
    /// Average query time in milliseconds
    pub avg_query_time_ms: Boundary,
}

impl Default for DatabaseThresholds {
    fn default() -> Self {
        Self {
            max_waiting_clients: 5,
            pool_saturation: 0.9,
            avg_query_time_ms: Boundary::new(100.0, 500.0),
        }
    }
}

/// Thresholds for per-domain and task-processing application checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationThresholds {
    /// Domain error rate percent
    pub domain_error_rate: Boundary,
    /// Domain average latency in milliseconds
    pub domain_latency_ms: Boundary,
    /// Background task queue depth
    pub task_queue_depth: Boundary,
    /// Background task failure count
    pub task_failures: Boundary,
    /// Process memory usage percent
    pub process_memory_percent: Boundary,
}

impl Default for ApplicationThresholds {
    fn default() -> Self {
        Self {
            domain_error_rate: Boundary::new(3.0, 10.0),
            domain_latency_ms: Boundary::new(200.0, 500.0),
            task_queue_depth: Boundary::new(100.0, 200.0),
            task_failures: Boundary::new(10.0, 50.0),
            process_memory_percent: Boundary::new(75.0, 90.0),
        }
    }
}

/// Thresholds for rolling performance metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceThresholds {
    /// p95 response time in milliseconds
    pub p95_response_time_ms: Boundary,
    /// Error rate percent
    pub error_rate: Boundary,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            p95_response_time_ms: Boundary::new(1000.0, 2000.0),
            error_rate: Boundary::new(5.0, 10.0),
        }
    }
}

/// Thresholds for cache health checks
///
/// Hit rate is lower-is-worse: degraded below `warn`, critical below `critical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheThresholds {
    /// Cache memory usage percent
    pub memory_percent: Boundary,
    /// Hit rate percent (lower is worse)
    pub hit_rate: Boundary,
    /// Eviction rate percent
    pub eviction_rate: Boundary,
    /// Eviction rate above which the memory-pressure flag is raised
    pub memory_pressure_eviction_rate: f64,
}

impl Default for CacheThresholds {
    fn default() -> Self {
        Self {
            memory_percent: Boundary::new(80.0, 95.0),
            hit_rate: Boundary::new(70.0, 50.0),
            eviction_rate: Boundary::new(20.0, 50.0),
            memory_pressure_eviction_rate: 10.0,
        }
    }
}

/// Thresholds for security posture checks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityThresholds {
    /// Failed login attempts per hour
    pub failed_logins_per_hour: Boundary,
    /// Days to certificate expiry below which SSL is degraded
    pub cert_expiry_warn_days: i64,
    /// Blocked attempts per hour above which the firewall looks under attack
    pub blocked_attempts_per_hour: u64,
}

impl Default for SecurityThresholds {
    fn default() -> Self {
        Self {
            failed_logins_per_hour: Boundary::new(20.0, 50.0),
            cert_expiry_warn_days: 30,
            blocked_attempts_per_hour: 1000,
        }
    }
}
