//! Security posture health checks
//!
//! Authentication pressure, TLS certificate expiry, firewall activity,
//! patch level and regulatory compliance. Login and firewall counters are
//! fed by the auth and edge collaborators; posture facts (certificate,
//! patches, compliance flags) come from configuration.

use crate::config::SecurityThresholds;
use crate::monitoring::types::{ComponentHealth, HealthStatus};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::warn;

/// Audit events retained
const AUDIT_LOG_CAPACITY: usize = 1000;

/// Deployment security facts the process cannot observe itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityPosture {
    /// TLS certificate expiry; `None` means no certificate configured
    pub cert_expires_at: Option<DateTime<Utc>>,
    /// Whether the certificate chain currently validates
    pub cert_valid: bool,
    /// Critical patches awaiting installation
    pub pending_critical_patches: u32,
    /// Mandatory regulatory flag
    pub gdpr_compliant: bool,
    /// Secondary compliance flag
    pub audit_logging_enabled: bool,
}

impl Default for SecurityPosture {
    fn default() -> Self {
        Self {
            cert_expires_at: None,
            cert_valid: true,
            pending_critical_patches: 0,
            gdpr_compliant: true,
            audit_logging_enabled: true,
        }
    }
}

impl SecurityPosture {
    /// Load posture facts from environment variables
    pub fn from_env() -> Self {
        let mut posture = Self::default();
        if let Ok(raw) = std::env::var("HEALTH_TLS_CERT_EXPIRY") {
            match raw.parse::<DateTime<Utc>>() {
                Ok(expiry) => posture.cert_expires_at = Some(expiry),
                Err(e) => warn!("ignoring unparseable HEALTH_TLS_CERT_EXPIRY: {}", e),
            }
        }
        if let Ok(raw) = std::env::var("HEALTH_PENDING_CRITICAL_PATCHES") {
            posture.pending_critical_patches = raw.parse().unwrap_or(0);
        }
        if let Ok(raw) = std::env::var("HEALTH_GDPR_COMPLIANT") {
            posture.gdpr_compliant = raw != "false";
        }
        if let Ok(raw) = std::env::var("HEALTH_AUDIT_LOGGING") {
            posture.audit_logging_enabled = raw != "false";
        }
        posture
    }
}

/// One recorded security event
#[derive(Debug, Clone, Serialize)]
pub struct SecurityEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub detail: String,
}

/// Authentication health detail
#[derive(Debug, Clone, Serialize)]
pub struct AuthHealth {
    pub status: HealthStatus,
    pub failed_attempts_last_hour: u64,
}

/// TLS certificate health detail
#[derive(Debug, Clone, Serialize)]
pub struct SslHealth {
    pub status: HealthStatus,
    pub cert_valid: bool,
    pub days_until_expiry: Option<i64>,
}

/// Firewall health detail
#[derive(Debug, Clone, Serialize)]
pub struct FirewallHealth {
    pub status: HealthStatus,
    pub blocked_attempts_last_hour: u64,
}

/// Patch level detail
#[derive(Debug, Clone, Serialize)]
pub struct UpdateHealth {
    pub status: HealthStatus,
    pub pending_critical_patches: u32,
}

/// Compliance detail
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceHealth {
    pub status: HealthStatus,
    pub gdpr_compliant: bool,
    pub audit_logging_enabled: bool,
}

/// Full security health detail
#[derive(Debug, Clone, Serialize)]
pub struct SecurityHealth {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub authentication: AuthHealth,
    pub ssl: SslHealth,
    pub firewall: FirewallHealth,
    pub updates: UpdateHealth,
    pub compliance: ComplianceHealth,
}

/// On-demand scan report
#[derive(Debug, Clone, Serialize)]
pub struct SecurityScanReport {
    pub status: HealthStatus,
    pub scanned_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub findings: Vec<String>,
}

#[derive(Debug, Default)]
struct SecurityState {
    failed_logins: VecDeque<DateTime<Utc>>,
    blocked_attempts: VecDeque<DateTime<Utc>>,
    audit_log: VecDeque<SecurityEvent>,
}

/// Security posture health service
pub struct SecurityHealthService {
    thresholds: SecurityThresholds,
    posture: SecurityPosture,
    state: Mutex<SecurityState>,
}

impl SecurityHealthService {
    /// Create the security leaf
    pub fn new(thresholds: SecurityThresholds, posture: SecurityPosture) -> Self {
        Self {
            thresholds,
            posture,
            state: Mutex::new(SecurityState::default()),
        }
    }

    fn push_event(state: &mut SecurityState, kind: &str, detail: String) {
        state.audit_log.push_back(SecurityEvent {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind: kind.to_string(),
            detail,
        });
        while state.audit_log.len() > AUDIT_LOG_CAPACITY {
            state.audit_log.pop_front();
        }
    }

    /// Record a failed login attempt
    pub fn record_failed_login(&self, source: &str) {
        let mut state = self.state.lock();
        state.failed_logins.push_back(Utc::now());
        Self::push_event(&mut state, "failed_login", format!("failed login from {}", source));
    }

    /// Record a firewall-blocked attempt
    pub fn record_blocked_attempt(&self, source: &str) {
        let mut state = self.state.lock();
        state.blocked_attempts.push_back(Utc::now());
        Self::push_event(&mut state, "blocked_attempt", format!("blocked request from {}", source));
    }

    fn count_last_hour(events: &VecDeque<DateTime<Utc>>) -> u64 {
        let cutoff = Utc::now() - ChronoDuration::hours(1);
        events.iter().filter(|t| **t > cutoff).count() as u64
    }

    /// Failed-login pressure over the trailing hour
    pub fn get_authentication_health(&self) -> AuthHealth {
        let failed = Self::count_last_hour(&self.state.lock().failed_logins);
        AuthHealth {
            status: HealthStatus::from_breach(
                failed as f64,
                self.thresholds.failed_logins_per_hour.warn,
                self.thresholds.failed_logins_per_hour.critical,
            ),
            failed_attempts_last_hour: failed,
        }
    }

    /// Certificate validity and time to expiry
    pub fn get_ssl_health(&self) -> SslHealth {
        if !self.posture.cert_valid {
            return SslHealth {
                status: HealthStatus::Critical,
                cert_valid: false,
                days_until_expiry: None,
            };
        }
        match self.posture.cert_expires_at {
            Some(expiry) => {
                let days = (expiry - Utc::now()).num_days();
                let status = if days < 0 {
                    HealthStatus::Critical
                } else if days < self.thresholds.cert_expiry_warn_days {
                    HealthStatus::Degraded
                } else {
                    HealthStatus::Healthy
                };
                SslHealth {
                    status,
                    cert_valid: true,
                    days_until_expiry: Some(days),
                }
            }
            None => SslHealth {
                // TLS terminated upstream; nothing to judge here
                status: HealthStatus::Healthy,
                cert_valid: true,
                days_until_expiry: None,
            },
        }
    }

    /// Blocked-attempt volume as a possible attack signal
    pub fn get_firewall_health(&self) -> FirewallHealth {
        let blocked = Self::count_last_hour(&self.state.lock().blocked_attempts);
        FirewallHealth {
            status: if blocked > self.thresholds.blocked_attempts_per_hour {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            blocked_attempts_last_hour: blocked,
        }
    }

    /// Pending patch level
    pub fn get_update_health(&self) -> UpdateHealth {
        UpdateHealth {
            status: if self.posture.pending_critical_patches > 0 {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            pending_critical_patches: self.posture.pending_critical_patches,
        }
    }

    /// Regulatory compliance flags
    pub fn get_compliance_health(&self) -> ComplianceHealth {
        let status = if !self.posture.gdpr_compliant {
            HealthStatus::Critical
        } else if !self.posture.audit_logging_enabled {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        ComplianceHealth {
            status,
            gdpr_compliant: self.posture.gdpr_compliant,
            audit_logging_enabled: self.posture.audit_logging_enabled,
        }
    }

    /// Full security detail
    pub fn get_security_status(&self) -> SecurityHealth {
        let authentication = self.get_authentication_health();
        let ssl = self.get_ssl_health();
        let firewall = self.get_firewall_health();
        let updates = self.get_update_health();
        let compliance = self.get_compliance_health();

        let status = HealthStatus::combine([
            authentication.status,
            ssl.status,
            firewall.status,
            updates.status,
            compliance.status,
        ]);

        SecurityHealth {
            status,
            timestamp: Utc::now(),
            authentication,
            ssl,
            firewall,
            updates,
            compliance,
        }
    }

    /// Run every security check on demand and list the findings
    pub fn run_security_scan(&self) -> SecurityScanReport {
        let started = Instant::now();
        let detail = self.get_security_status();

        let mut findings = Vec::new();
        if detail.authentication.status != HealthStatus::Healthy {
            findings.push(format!(
                "{} failed logins in the last hour",
                detail.authentication.failed_attempts_last_hour
            ));
        }
        match (detail.ssl.status, detail.ssl.days_until_expiry) {
            (HealthStatus::Critical, _) => findings.push("TLS certificate invalid or expired".to_string()),
            (HealthStatus::Degraded, Some(days)) => {
                findings.push(format!("TLS certificate expires in {} days", days))
            }
            _ => {}
        }
        if detail.firewall.status != HealthStatus::Healthy {
            findings.push(format!(
                "abnormal firewall activity: {} blocked attempts in the last hour",
                detail.firewall.blocked_attempts_last_hour
            ));
        }
        if detail.updates.pending_critical_patches > 0 {
            findings.push(format!(
                "{} critical patches pending",
                detail.updates.pending_critical_patches
            ));
        }
        if !detail.compliance.gdpr_compliant {
            findings.push("GDPR compliance flag is false".to_string());
        }
        if !detail.compliance.audit_logging_enabled {
            findings.push("audit logging is disabled".to_string());
        }

        {
            let mut state = self.state.lock();
            Self::push_event(
                &mut state,
                "security_scan",
                format!("scan completed with {} findings", findings.len()),
            );
        }

        SecurityScanReport {
            status: detail.status,
            scanned_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
            findings,
        }
    }

    /// Most recent audit events, newest last
    pub fn get_security_audit_log(&self, limit: usize) -> Vec<SecurityEvent> {
        let state = self.state.lock();
        let skip = state.audit_log.len().saturating_sub(limit);
        state.audit_log.iter().skip(skip).cloned().collect()
    }

    /// Drop hour-window entries past their horizon
    pub fn prune(&self) {
        let cutoff = Utc::now() - ChronoDuration::hours(1);
        let mut state = self.state.lock();
        while state.failed_logins.front().is_some_and(|t| *t <= cutoff) {
            state.failed_logins.pop_front();
        }
        while state.blocked_attempts.front().is_some_and(|t| *t <= cutoff) {
            state.blocked_attempts.pop_front();
        }
    }

    /// Aggregation entry point
    pub fn check(&self) -> ComponentHealth {
        let detail = self.get_security_status();
        let message = match detail.status {
            HealthStatus::Healthy => "Security posture nominal".to_string(),
            _ => format!("Security posture {}", detail.status),
        };
        ComponentHealth::new("security", detail.status, message, &detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(posture: SecurityPosture) -> SecurityHealthService {
        SecurityHealthService::new(SecurityThresholds::default(), posture)
    }

    #[test]
    fn test_auth_degrades_with_failed_logins() {
        let security = service(SecurityPosture::default());
        for _ in 0..25 {
            security.record_failed_login("10.0.0.1");
        }
        assert_eq!(security.get_authentication_health().status, HealthStatus::Degraded);

        for _ in 0..30 {
            security.record_failed_login("10.0.0.1");
        }
        assert_eq!(security.get_authentication_health().status, HealthStatus::Critical);
    }

    #[test]
    fn test_ssl_expiry_classification() {
        let soon = service(SecurityPosture {
            cert_expires_at: Some(Utc::now() + ChronoDuration::days(10)),
            ..SecurityPosture::default()
        });
        let health = soon.get_ssl_health();
        assert_eq!(health.status, HealthStatus::Degraded);
        assert!(health.days_until_expiry.unwrap() <= 10);

        let invalid = service(SecurityPosture {
            cert_valid: false,
            ..SecurityPosture::default()
        });
        assert_eq!(invalid.get_ssl_health().status, HealthStatus::Critical);

        let unconfigured = service(SecurityPosture::default());
        assert_eq!(unconfigured.get_ssl_health().status, HealthStatus::Healthy);
    }

    #[test]
    fn test_compliance_flags() {
        let non_gdpr = service(SecurityPosture {
            gdpr_compliant: false,
            ..SecurityPosture::default()
        });
        assert_eq!(non_gdpr.get_compliance_health().status, HealthStatus::Critical);

        let no_audit = service(SecurityPosture {
            audit_logging_enabled: false,
            ..SecurityPosture::default()
        });
        assert_eq!(no_audit.get_compliance_health().status, HealthStatus::Degraded);
    }

    #[test]
    fn test_pending_patches_degrade() {
        let security = service(SecurityPosture {
            pending_critical_patches: 2,
            ..SecurityPosture::default()
        });
        assert_eq!(security.get_update_health().status, HealthStatus::Degraded);
    }

    #[test]
    fn test_audit_log_is_bounded_and_ordered() {
        let security = service(SecurityPosture::default());
        for i in 0..(AUDIT_LOG_CAPACITY + 100) {
            security.record_blocked_attempt(&format!("10.0.0.{}", i % 255));
        }
        let events = security.get_security_audit_log(usize::MAX);
        assert_eq!(events.len(), AUDIT_LOG_CAPACITY);

        let last_two = security.get_security_audit_log(2);
        assert_eq!(last_two.len(), 2);
        assert!(last_two[0].timestamp <= last_two[1].timestamp);
    }

    #[test]
    fn test_scan_collects_findings() {
        let security = service(SecurityPosture {
            gdpr_compliant: false,
            pending_critical_patches: 1,
            ..SecurityPosture::default()
        });
        let report = security.run_security_scan();
        assert_eq!(report.status, HealthStatus::Critical);
        assert!(report.findings.iter().any(|f| f.contains("GDPR")));
        assert!(report.findings.iter().any(|f| f.contains("critical patches")));
    }
}
