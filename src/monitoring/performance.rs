//! Rolling performance metrics
//!
//! Response-time percentiles over a capped sample window, per-minute
//! request/error buckets for the trailing hour, throughput over the trailing
//! minute, trend detection, and Prometheus exposition of the lot.

use crate::config::PerformanceThresholds;
use crate::monitoring::types::{ComponentHealth, HealthStatus};
use crate::monitoring::window::{mean, percentile, RollingWindow};
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Response-time samples retained
const RESPONSE_WINDOW: usize = 1000;
/// Per-minute buckets retained (one hour)
const MINUTE_BUCKETS: usize = 60;
/// Samples on each side of the trend comparison
const TREND_SPAN: usize = 10;

/// Direction of the recent response-time trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Degrading,
}

/// One minute of request/error counts
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MinuteBucket {
    /// Unix epoch minute this bucket covers
    pub minute: i64,
    pub requests: u64,
    pub errors: u64,
}

/// Response-time detail
#[derive(Debug, Clone, Serialize)]
pub struct ResponseTimeMetrics {
    pub samples: usize,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub trend: Trend,
}

/// Throughput detail
#[derive(Debug, Clone, Serialize)]
pub struct ThroughputMetrics {
    pub requests_last_minute: u64,
    pub requests_per_second: f64,
    pub total_requests: u64,
}

/// Error-rate detail over the trailing hour
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRateMetrics {
    pub total_requests: u64,
    pub total_errors: u64,
    /// Percent of requests that failed within the retained hour
    pub error_rate: f64,
    pub minutes: Vec<MinuteBucket>,
}

/// Full performance detail
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceMetrics {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime_seconds: u64,
    pub response_times: ResponseTimeMetrics,
    pub throughput: ThroughputMetrics,
    pub error_rates: ErrorRateMetrics,
}

struct PerfState {
    response_times: RollingWindow<f64>,
    minutes: RollingWindow<MinuteBucket>,
    /// Request arrival instants within the trailing minute
    recent: Vec<Instant>,
    total_requests: u64,
    total_errors: u64,
}

/// Performance health service
pub struct PerformanceHealthService {
    thresholds: PerformanceThresholds,
    state: Mutex<PerfState>,
    started_at: Instant,
}

impl PerformanceHealthService {
    /// Create the performance leaf
    pub fn new(thresholds: PerformanceThresholds) -> Self {
        Self {
            thresholds,
            state: Mutex::new(PerfState {
                response_times: RollingWindow::new(RESPONSE_WINDOW),
                minutes: RollingWindow::new(MINUTE_BUCKETS),
                recent: Vec::new(),
                total_requests: 0,
                total_errors: 0,
            }),
            started_at: Instant::now(),
        }
    }

    /// Record one completed request
    pub fn record_metrics(&self, response_time_ms: f64, success: bool) {
        let minute = chrono::Utc::now().timestamp() / 60;
        let mut state = self.state.lock();

        state.response_times.push(response_time_ms);
        state.total_requests += 1;
        if !success {
            state.total_errors += 1;
        }
        state.recent.push(Instant::now());
        // Inline trim so a long gap between reads cannot grow this unbounded
        if state.recent.len() > 10_000 {
            let cutoff = Duration::from_secs(60);
            state.recent.retain(|t| t.elapsed() <= cutoff);
        }

        let current = state.minutes.last_mut().filter(|b| b.minute == minute);
        match current {
            Some(bucket) => {
                bucket.requests += 1;
                if !success {
                    bucket.errors += 1;
                }
            }
            None => {
                state.minutes.push(MinuteBucket {
                    minute,
                    requests: 1,
                    errors: if success { 0 } else { 1 },
                });
            }
        }
    }

    /// Percentiles and trend over the retained window
    pub fn get_response_time_metrics(&self) -> ResponseTimeMetrics {
        let samples = self.state.lock().response_times.snapshot();
        let trend = Self::trend(&samples);
        ResponseTimeMetrics {
            samples: samples.len(),
            avg_ms: mean(&samples),
            p50_ms: percentile(&samples, 50.0),
            p95_ms: percentile(&samples, 95.0),
            p99_ms: percentile(&samples, 99.0),
            trend,
        }
    }

    /// Mean of the most recent samples against the preceding span
    fn trend(samples: &[f64]) -> Trend {
        if samples.len() < TREND_SPAN * 2 {
            return Trend::Stable;
        }
        let recent = &samples[samples.len() - TREND_SPAN..];
        let previous = &samples[samples.len() - TREND_SPAN * 2..samples.len() - TREND_SPAN];
        let previous_mean = mean(previous);
        if previous_mean == 0.0 {
            return Trend::Stable;
        }
        let ratio = mean(recent) / previous_mean;
        if ratio < 0.9 {
            Trend::Improving
        } else if ratio > 1.1 {
            Trend::Degrading
        } else {
            Trend::Stable
        }
    }

    /// Requests over the trailing minute
    pub fn get_throughput_metrics(&self) -> ThroughputMetrics {
        let mut state = self.state.lock();
        let cutoff = Duration::from_secs(60);
        state.recent.retain(|t| t.elapsed() <= cutoff);

        let requests_last_minute = state.recent.len() as u64;
        // Early in the process lifetime the window is shorter than a minute
        let elapsed = self.started_at.elapsed().as_secs_f64().clamp(1.0, 60.0);

        ThroughputMetrics {
            requests_last_minute,
            requests_per_second: requests_last_minute as f64 / elapsed,
            total_requests: state.total_requests,
        }
    }

    /// Error rate over the retained hour of minute buckets
    pub fn get_error_rate_metrics(&self) -> ErrorRateMetrics {
        let state = self.state.lock();
        let minutes = state.minutes.snapshot();
        let requests: u64 = minutes.iter().map(|b| b.requests).sum();
        let errors: u64 = minutes.iter().map(|b| b.errors).sum();
        ErrorRateMetrics {
            total_requests: state.total_requests,
            total_errors: state.total_errors,
            error_rate: if requests > 0 {
                errors as f64 / requests as f64 * 100.0
            } else {
                0.0
            },
            minutes,
        }
    }

    /// Full detail with status classification
    pub fn get_performance_metrics(&self) -> PerformanceMetrics {
        let response_times = self.get_response_time_metrics();
        let throughput = self.get_throughput_metrics();
        let error_rates = self.get_error_rate_metrics();

        let by_latency = HealthStatus::from_breach(
            response_times.p95_ms,
            self.thresholds.p95_response_time_ms.warn,
            self.thresholds.p95_response_time_ms.critical,
        );
        let by_errors = HealthStatus::from_breach(
            error_rates.error_rate,
            self.thresholds.error_rate.warn,
            self.thresholds.error_rate.critical,
        );

        PerformanceMetrics {
            status: by_latency.worst(by_errors),
            timestamp: chrono::Utc::now(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            response_times,
            throughput,
            error_rates,
        }
    }

    /// Serialize current metrics as Prometheus exposition text
    pub fn get_prometheus_metrics(&self) -> String {
        let metrics = self.get_performance_metrics();
        let rt = &metrics.response_times;

        format!(
            r#"# HELP http_response_time_seconds_avg Average response time in seconds
# TYPE http_response_time_seconds_avg gauge
http_response_time_seconds_avg {:.6}

# HELP http_response_time_seconds_p50 Median response time in seconds
# TYPE http_response_time_seconds_p50 gauge
http_response_time_seconds_p50 {:.6}

# HELP http_response_time_seconds_p95 95th percentile response time in seconds
# TYPE http_response_time_seconds_p95 gauge
http_response_time_seconds_p95 {:.6}

# HELP http_response_time_seconds_p99 99th percentile response time in seconds
# TYPE http_response_time_seconds_p99 gauge
http_response_time_seconds_p99 {:.6}

# HELP http_requests_total Total requests recorded
# TYPE http_requests_total counter
http_requests_total {}

# HELP http_requests_per_second Requests per second over the trailing minute
# TYPE http_requests_per_second gauge
http_requests_per_second {:.6}

# HELP http_error_rate_percent Error percentage over the trailing hour
# TYPE http_error_rate_percent gauge
http_error_rate_percent {:.6}

# HELP process_uptime_seconds Process uptime in seconds
# TYPE process_uptime_seconds counter
process_uptime_seconds {}
"#,
            rt.avg_ms / 1000.0,
            rt.p50_ms / 1000.0,
            rt.p95_ms / 1000.0,
            rt.p99_ms / 1000.0,
            metrics.throughput.total_requests,
            metrics.throughput.requests_per_second,
            metrics.error_rates.error_rate,
            metrics.uptime_seconds,
        )
    }

    /// Trim the trailing-minute arrival list; windows are already bounded
    pub fn prune(&self) {
        let mut state = self.state.lock();
        let cutoff = Duration::from_secs(60);
        state.recent.retain(|t| t.elapsed() <= cutoff);
    }

    /// Aggregation entry point
    pub fn check(&self) -> ComponentHealth {
        let detail = self.get_performance_metrics();
        let message = match detail.status {
            HealthStatus::Healthy => "Performance within thresholds".to_string(),
            _ => format!(
                "p95 {:.0}ms, error rate {:.1}%",
                detail.response_times.p95_ms, detail.error_rates.error_rate
            ),
        };
        ComponentHealth::new("performance", detail.status, message, &detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> PerformanceHealthService {
        PerformanceHealthService::new(PerformanceThresholds::default())
    }

    #[test]
    fn test_percentile_ordering_holds() {
        let service = service();
        for i in 0..500 {
            service.record_metrics((i % 97) as f64, true);
        }
        let rt = service.get_response_time_metrics();
        assert!(rt.p50_ms <= rt.p95_ms);
        assert!(rt.p95_ms <= rt.p99_ms);
    }

    #[test]
    fn test_single_sample_percentiles_equal() {
        let service = service();
        service.record_metrics(123.0, true);
        let rt = service.get_response_time_metrics();
        assert_eq!(rt.p50_ms, 123.0);
        assert_eq!(rt.p95_ms, 123.0);
        assert_eq!(rt.p99_ms, 123.0);
    }

    #[test]
    fn test_window_capacity() {
        let service = service();
        for i in 0..5000 {
            service.record_metrics(i as f64, true);
        }
        let rt = service.get_response_time_metrics();
        assert_eq!(rt.samples, 1000);
        // Retained samples are exactly the last 1000 appended
        assert_eq!(rt.p99_ms, 4989.0);
    }

    #[test]
    fn test_trend_detection() {
        let degrading = service();
        for _ in 0..10 {
            degrading.record_metrics(100.0, true);
        }
        for _ in 0..10 {
            degrading.record_metrics(200.0, true);
        }
        assert_eq!(degrading.get_response_time_metrics().trend, Trend::Degrading);

        let improving = service();
        for _ in 0..10 {
            improving.record_metrics(200.0, true);
        }
        for _ in 0..10 {
            improving.record_metrics(100.0, true);
        }
        assert_eq!(improving.get_response_time_metrics().trend, Trend::Improving);

        let stable = service();
        for _ in 0..20 {
            stable.record_metrics(100.0, true);
        }
        assert_eq!(stable.get_response_time_metrics().trend, Trend::Stable);
    }

    #[test]
    fn test_trend_needs_enough_samples() {
        let service = service();
        for _ in 0..19 {
            service.record_metrics(100.0, true);
        }
        assert_eq!(service.get_response_time_metrics().trend, Trend::Stable);
    }

    #[test]
    fn test_error_rate_classification() {
        let service = service();
        for i in 0..100 {
            service.record_metrics(10.0, i % 10 != 0);
        }
        // 10% errors breaches the 5% warn boundary but not >10% critical
        let metrics = service.get_performance_metrics();
        assert_eq!(metrics.error_rates.error_rate, 10.0);
        assert_eq!(metrics.status, HealthStatus::Degraded);
    }

    #[test]
    fn test_error_rate_zero_without_traffic() {
        let metrics = service().get_error_rate_metrics();
        assert_eq!(metrics.error_rate, 0.0);
        assert_eq!(metrics.total_requests, 0);
    }

    #[test]
    fn test_throughput_counts_recent_requests() {
        let service = service();
        for _ in 0..30 {
            service.record_metrics(5.0, true);
        }
        let throughput = service.get_throughput_metrics();
        assert_eq!(throughput.requests_last_minute, 30);
        assert!(throughput.requests_per_second > 0.0);
        assert_eq!(throughput.total_requests, 30);
    }

    #[test]
    fn test_prometheus_exposition_shape() {
        let service = service();
        for _ in 0..5 {
            service.record_metrics(250.0, true);
        }
        let text = service.get_prometheus_metrics();

        let mut last_help: Option<String> = None;
        let mut last_type: Option<String> = None;
        for line in text.lines().filter(|l| !l.is_empty()) {
            if let Some(rest) = line.strip_prefix("# HELP ") {
                last_help = rest.split_whitespace().next().map(str::to_string);
            } else if let Some(rest) = line.strip_prefix("# TYPE ") {
                last_type = rest.split_whitespace().next().map(str::to_string);
            } else {
                let mut parts = line.split_whitespace();
                let name = parts.next().unwrap();
                let value: f64 = parts.next().unwrap().parse().unwrap();
                // Every metric line is preceded by matching HELP and TYPE
                assert_eq!(last_help.as_deref(), Some(name));
                assert_eq!(last_type.as_deref(), Some(name));
                assert!(value.is_finite());
            }
        }
        assert!(text.contains("http_response_time_seconds_p95"));
        // Milliseconds converted to seconds
        assert!(text.contains("http_response_time_seconds_avg 0.250000"));
    }
}
