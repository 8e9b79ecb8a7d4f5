//! Type definitions shared by all health components

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity classification of a component or of the whole system
///
/// Aggregation order (worst first): critical > degraded > unknown > healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
    Unknown,
}

impl HealthStatus {
    /// Rank used when merging component statuses; higher is worse
    fn severity_rank(self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::Unknown => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Critical => 3,
        }
    }

    /// The worse of two statuses
    pub fn worst(self, other: HealthStatus) -> HealthStatus {
        if other.severity_rank() > self.severity_rank() {
            other
        } else {
            self
        }
    }

    /// Fold a sequence of statuses into the overall status
    pub fn combine<I: IntoIterator<Item = HealthStatus>>(statuses: I) -> HealthStatus {
        statuses
            .into_iter()
            .fold(HealthStatus::Healthy, HealthStatus::worst)
    }

    /// Classify a higher-is-worse metric against a warn/critical boundary
    pub fn from_breach(value: f64, warn: f64, critical: f64) -> HealthStatus {
        if value > critical {
            HealthStatus::Critical
        } else if value > warn {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Critical => write!(f, "critical"),
            HealthStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Coarse status plus a one-line message, used by the cheap status views
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub status: HealthStatus,
    pub message: String,
}

/// Health of a single component, produced fresh on every check
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Severity classification
    pub status: HealthStatus,
    /// Check timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Human-readable status message
    pub message: String,
    /// Component-specific metric fields
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
    /// Error message when the check itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    /// Build a component result with serialized detail fields
    pub fn new<T: Serialize>(name: &str, status: HealthStatus, message: String, details: &T) -> Self {
        Self {
            name: name.to_string(),
            status,
            timestamp: chrono::Utc::now(),
            message,
            details: serde_json::to_value(details).unwrap_or(serde_json::Value::Null),
            error: None,
        }
    }

    /// Synthetic placeholder for a leaf whose check failed outright
    pub fn failed(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            status: HealthStatus::Critical,
            timestamp: chrono::Utc::now(),
            message: format!("{} health check failed", name),
            details: serde_json::Value::Null,
            error: Some(error),
        }
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Low => write!(f, "LOW"),
            AlertSeverity::Medium => write!(f, "MEDIUM"),
            AlertSeverity::High => write!(f, "HIGH"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Alert derived from a non-healthy component during aggregation
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// Alert ID
    pub id: String,
    /// Component the alert was raised for
    pub service: String,
    /// Component status that triggered the alert
    pub status: HealthStatus,
    /// Alert message
    pub message: String,
    /// Alert timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Alert severity
    pub severity: AlertSeverity,
}

/// Per-status component counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub critical: usize,
    pub unknown: usize,
}

impl HealthSummary {
    /// Tally component statuses
    pub fn from_components<'a, I: IntoIterator<Item = &'a ComponentHealth>>(components: I) -> Self {
        let mut summary = Self::default();
        for component in components {
            summary.total += 1;
            match component.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Degraded => summary.degraded += 1,
                HealthStatus::Critical => summary.critical += 1,
                HealthStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }
}

/// The consolidated report returned by the comprehensive check
///
/// Ephemeral: built per call and handed straight to the HTTP boundary.
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveHealthReport {
    /// Overall status derived from all components
    pub status: HealthStatus,
    /// Report timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Process uptime in seconds
    pub uptime_seconds: u64,
    /// Per-status counts
    pub summary: HealthSummary,
    /// Component results keyed by name
    pub services: HashMap<String, ComponentHealth>,
    /// One alert per non-healthy component
    pub alerts: Vec<Alert>,
    /// Deterministic remediation suggestions
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_ordering() {
        use HealthStatus::*;
        assert_eq!(Healthy.worst(Degraded), Degraded);
        assert_eq!(Degraded.worst(Critical), Critical);
        assert_eq!(Unknown.worst(Healthy), Unknown);
        assert_eq!(Degraded.worst(Unknown), Degraded);
    }

    #[test]
    fn test_combine_follows_aggregation_rule() {
        use HealthStatus::*;
        assert_eq!(HealthStatus::combine([Healthy, Degraded, Critical]), Critical);
        assert_eq!(HealthStatus::combine([Healthy, Degraded, Unknown]), Degraded);
        assert_eq!(HealthStatus::combine([Healthy, Healthy]), Healthy);
        assert_eq!(HealthStatus::combine([]), Healthy);
    }

    #[test]
    fn test_breach_classification() {
        assert_eq!(HealthStatus::from_breach(50.0, 70.0, 90.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_breach(75.0, 70.0, 90.0), HealthStatus::Degraded);
        assert_eq!(HealthStatus::from_breach(95.0, 70.0, 90.0), HealthStatus::Critical);
        // Boundary values are inclusive of the lower tier
        assert_eq!(HealthStatus::from_breach(70.0, 70.0, 90.0), HealthStatus::Healthy);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&HealthStatus::Degraded).unwrap(), "\"degraded\"");
        assert_eq!(serde_json::to_string(&AlertSeverity::High).unwrap(), "\"high\"");
    }

    #[test]
    fn test_summary_tally() {
        let components = vec![
            ComponentHealth::new("a", HealthStatus::Healthy, "ok".to_string(), &()),
            ComponentHealth::new("b", HealthStatus::Degraded, "slow".to_string(), &()),
            ComponentHealth::failed("c", "boom".to_string()),
        ];
        let summary = HealthSummary::from_components(&components);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.unknown, 0);
    }
}
