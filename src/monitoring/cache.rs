//! Cache health checks
//!
//! Hit rate, eviction pressure and memory usage for the application cache.
//! Operation counts arrive through `record_cache_operation`; memory and key
//! gauges are fed by the cache layer through `update_usage`.

use crate::config::CacheThresholds;
use crate::monitoring::types::{ComponentHealth, HealthStatus};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Default)]
struct CacheCounters {
    hits: u64,
    misses: u64,
    evicted: u64,
    expired: u64,
    live_keys: u64,
    memory_used_bytes: u64,
    memory_limit_bytes: u64,
}

/// Raw cache statistics
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    /// Percent of requests served from cache; 0 when no requests recorded
    pub hit_rate: f64,
    pub evicted: u64,
    pub expired: u64,
    pub live_keys: u64,
    pub memory_used_bytes: u64,
    pub memory_limit_bytes: u64,
}

/// Classified cache health
#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub stats: CacheStats,
    /// Percent of the memory limit in use
    pub memory_percent: f64,
    /// Evicted share of all keys that passed through the cache
    pub eviction_rate: f64,
    pub memory_pressure: bool,
}

/// Result of an administrative cache flush
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheClearResult {
    pub cleared_keys: u64,
    pub freed_bytes: u64,
}

/// Cache health service
pub struct CacheHealthService {
    thresholds: CacheThresholds,
    counters: Mutex<CacheCounters>,
}

impl CacheHealthService {
    /// Create the cache leaf with a memory budget
    pub fn new(thresholds: CacheThresholds, memory_limit_bytes: u64) -> Self {
        Self {
            thresholds,
            counters: Mutex::new(CacheCounters {
                memory_limit_bytes,
                ..CacheCounters::default()
            }),
        }
    }

    /// Record one cache lookup
    pub fn record_cache_operation(&self, hit: bool) {
        let mut counters = self.counters.lock();
        if hit {
            counters.hits += 1;
        } else {
            counters.misses += 1;
        }
    }

    /// Record eviction activity
    pub fn record_eviction(&self, evicted: u64, expired: u64) {
        let mut counters = self.counters.lock();
        counters.evicted += evicted;
        counters.expired += expired;
        counters.live_keys = counters.live_keys.saturating_sub(evicted + expired);
    }

    /// Gauge feed from the cache layer
    pub fn update_usage(&self, memory_used_bytes: u64, live_keys: u64) {
        let mut counters = self.counters.lock();
        counters.memory_used_bytes = memory_used_bytes;
        counters.live_keys = live_keys;
    }

    /// Raw counters with derived hit rate
    pub fn get_cache_stats(&self) -> CacheStats {
        let counters = self.counters.lock();
        let total_requests = counters.hits + counters.misses;
        CacheStats {
            hits: counters.hits,
            misses: counters.misses,
            total_requests,
            hit_rate: if total_requests > 0 {
                counters.hits as f64 / total_requests as f64 * 100.0
            } else {
                0.0
            },
            evicted: counters.evicted,
            expired: counters.expired,
            live_keys: counters.live_keys,
            memory_used_bytes: counters.memory_used_bytes,
            memory_limit_bytes: counters.memory_limit_bytes,
        }
    }

    /// Classified health across memory, hit rate and eviction pressure
    pub fn get_cache_health(&self) -> CacheHealth {
        let stats = self.get_cache_stats();

        let memory_percent = if stats.memory_limit_bytes > 0 {
            stats.memory_used_bytes as f64 / stats.memory_limit_bytes as f64 * 100.0
        } else {
            0.0
        };
        let memory_status = HealthStatus::from_breach(
            memory_percent,
            self.thresholds.memory_percent.warn,
            self.thresholds.memory_percent.critical,
        );

        // Hit rate is lower-is-worse; only judged once there is traffic
        let hit_status = if stats.total_requests == 0 {
            HealthStatus::Healthy
        } else if stats.hit_rate < self.thresholds.hit_rate.critical {
            HealthStatus::Critical
        } else if stats.hit_rate < self.thresholds.hit_rate.warn {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let key_turnover = stats.evicted + stats.expired + stats.live_keys;
        let eviction_rate = if key_turnover > 0 {
            stats.evicted as f64 / key_turnover as f64 * 100.0
        } else {
            0.0
        };
        let eviction_status = HealthStatus::from_breach(
            eviction_rate,
            self.thresholds.eviction_rate.warn,
            self.thresholds.eviction_rate.critical,
        );

        CacheHealth {
            status: HealthStatus::combine([memory_status, hit_status, eviction_status]),
            timestamp: chrono::Utc::now(),
            stats,
            memory_percent,
            eviction_rate,
            memory_pressure: eviction_rate > self.thresholds.memory_pressure_eviction_rate,
        }
    }

    /// Flush the cache; destructive, admin-gated at the HTTP boundary
    pub fn clear_cache(&self) -> CacheClearResult {
        let mut counters = self.counters.lock();
        let result = CacheClearResult {
            cleared_keys: counters.live_keys,
            freed_bytes: counters.memory_used_bytes,
        };
        counters.live_keys = 0;
        counters.memory_used_bytes = 0;
        info!(
            cleared_keys = result.cleared_keys,
            freed_bytes = result.freed_bytes,
            "cache cleared"
        );
        result
    }

    /// Aggregation entry point
    pub fn check(&self) -> ComponentHealth {
        let detail = self.get_cache_health();
        let message = match detail.status {
            HealthStatus::Healthy => "Cache healthy".to_string(),
            _ => format!(
                "hit rate {:.1}%, memory {:.1}%, eviction {:.1}%",
                detail.stats.hit_rate, detail.memory_percent, detail.eviction_rate
            ),
        };
        ComponentHealth::new("cache", detail.status, message, &detail)
    }
}
