//! OS-level resource health checks
//!
//! Samples CPU, memory, disk, network and load average via sysinfo. Any
//! failure to read an OS source collapses the affected check to critical
//! with zeroed metrics rather than propagating an error.

use crate::config::SystemThresholds;
use crate::monitoring::types::{ComponentHealth, HealthStatus, StatusSummary};
use serde::Serialize;
use sysinfo::{Disks, Networks, System};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// CPU health detail
#[derive(Debug, Clone, Serialize)]
pub struct CpuHealth {
    pub status: HealthStatus,
    pub usage_percent: f64,
    pub cores: usize,
    pub load_average_1m: f64,
    pub load_average_5m: f64,
    pub load_average_15m: f64,
}

/// Memory health detail
#[derive(Debug, Clone, Serialize)]
pub struct MemoryHealth {
    pub status: HealthStatus,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub usage_percent: f64,
}

/// Usage of one mounted filesystem
#[derive(Debug, Clone, Serialize)]
pub struct MountUsage {
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub usage_percent: f64,
    pub status: HealthStatus,
}

/// Disk health detail across all mount points
#[derive(Debug, Clone, Serialize)]
pub struct DiskHealth {
    pub status: HealthStatus,
    pub mounts: Vec<MountUsage>,
}

/// Network interface counters
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceStats {
    pub name: String,
    pub bytes_received: u64,
    pub bytes_transmitted: u64,
}

/// Network health detail
#[derive(Debug, Clone, Serialize)]
pub struct NetworkHealth {
    pub status: HealthStatus,
    pub interfaces: Vec<InterfaceStats>,
}

/// Full system health detail
#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cpu: CpuHealth,
    pub memory: MemoryHealth,
    pub disk: DiskHealth,
    pub network: NetworkHealth,
}

/// OS resource health service
pub struct SystemHealthService {
    thresholds: SystemThresholds,
    // sysinfo's System is refreshed in place; the CPU sample holds this
    // lock across its settling sleep so samples never interleave.
    sys: Mutex<System>,
}

impl SystemHealthService {
    /// Create the system leaf with the given thresholds
    pub fn new(thresholds: SystemThresholds) -> Self {
        Self {
            thresholds,
            sys: Mutex::new(System::new()),
        }
    }

    /// Coarse status plus a one-line message
    pub async fn get_system_status(&self) -> StatusSummary {
        let detail = self.get_detailed_system_health().await;
        let message = match detail.status {
            HealthStatus::Healthy => "System resources within normal limits".to_string(),
            _ => format!(
                "cpu {:.1}%, memory {:.1}%, worst disk {:.1}%",
                detail.cpu.usage_percent,
                detail.memory.usage_percent,
                detail
                    .disk
                    .mounts
                    .iter()
                    .map(|m| m.usage_percent)
                    .fold(0.0, f64::max)
            ),
        };
        StatusSummary {
            status: detail.status,
            message,
        }
    }

    /// Full detail across all resources
    pub async fn get_detailed_system_health(&self) -> SystemHealth {
        let cpu = self.get_cpu_health().await;
        let memory = self.get_memory_health().await;
        let disk = self.get_disk_health().await;
        let network = self.get_network_health().await;

        let status = HealthStatus::combine([cpu.status, memory.status, disk.status, network.status]);

        SystemHealth {
            status,
            timestamp: chrono::Utc::now(),
            cpu,
            memory,
            disk,
            network,
        }
    }

    /// CPU usage from two snapshots separated by a short settling interval,
    /// plus load average compared against `cores x multiplier`
    pub async fn get_cpu_health(&self) -> CpuHealth {
        let cores = num_cpus::get();

        let usage_percent = {
            let mut sys = self.sys.lock().await;
            sys.refresh_cpu_usage();
            // Two samples are needed for a usage delta; this blocks the
            // check (not the runtime) for the minimum settling interval.
            tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
            sys.refresh_cpu_usage();
            (sys.global_cpu_usage() as f64).min(100.0)
        };

        let load = System::load_average();
        let cpu_status = HealthStatus::from_breach(
            usage_percent,
            self.thresholds.cpu_percent.warn,
            self.thresholds.cpu_percent.critical,
        );
        let load_status = HealthStatus::from_breach(
            load.one,
            cores as f64 * self.thresholds.load_multiplier.warn,
            cores as f64 * self.thresholds.load_multiplier.critical,
        );

        debug!(usage_percent, load_1m = load.one, "sampled CPU");

        CpuHealth {
            status: cpu_status.worst(load_status),
            usage_percent,
            cores,
            load_average_1m: load.one,
            load_average_5m: load.five,
            load_average_15m: load.fifteen,
        }
    }

    /// Memory usage as used/total
    pub async fn get_memory_health(&self) -> MemoryHealth {
        let (total, used) = {
            let mut sys = self.sys.lock().await;
            sys.refresh_memory();
            (sys.total_memory(), sys.used_memory())
        };

        if total == 0 {
            warn!("memory totals unavailable, reporting critical");
            return MemoryHealth {
                status: HealthStatus::Critical,
                total_bytes: 0,
                used_bytes: 0,
                usage_percent: 0.0,
            };
        }

        let usage_percent = used as f64 / total as f64 * 100.0;
        MemoryHealth {
            status: HealthStatus::from_breach(
                usage_percent,
                self.thresholds.memory_percent.warn,
                self.thresholds.memory_percent.critical,
            ),
            total_bytes: total,
            used_bytes: used,
            usage_percent,
        }
    }

    /// Per-mount-point disk usage; overall is the worst mount
    pub async fn get_disk_health(&self) -> DiskHealth {
        let disks = Disks::new_with_refreshed_list();

        let mounts: Vec<MountUsage> = disks
            .iter()
            .filter(|disk| disk.total_space() > 0)
            .map(|disk| {
                let total = disk.total_space();
                let available = disk.available_space();
                let usage_percent = (total - available) as f64 / total as f64 * 100.0;
                MountUsage {
                    mount_point: disk.mount_point().to_string_lossy().into_owned(),
                    total_bytes: total,
                    available_bytes: available,
                    usage_percent,
                    status: HealthStatus::from_breach(
                        usage_percent,
                        self.thresholds.disk_percent.warn,
                        self.thresholds.disk_percent.critical,
                    ),
                }
            })
            .collect();

        if mounts.is_empty() {
            warn!("no mount points visible, reporting critical");
            return DiskHealth {
                status: HealthStatus::Critical,
                mounts,
            };
        }

        DiskHealth {
            status: HealthStatus::combine(mounts.iter().map(|m| m.status)),
            mounts,
        }
    }

    /// Interface byte counters; reachability is judged elsewhere
    pub async fn get_network_health(&self) -> NetworkHealth {
        let networks = Networks::new_with_refreshed_list();

        let interfaces: Vec<InterfaceStats> = networks
            .iter()
            .map(|(name, data)| InterfaceStats {
                name: name.clone(),
                bytes_received: data.total_received(),
                bytes_transmitted: data.total_transmitted(),
            })
            .collect();

        NetworkHealth {
            status: if interfaces.is_empty() {
                HealthStatus::Critical
            } else {
                HealthStatus::Healthy
            },
            interfaces,
        }
    }

    /// Aggregation entry point
    pub async fn check(&self) -> ComponentHealth {
        let detail = self.get_detailed_system_health().await;
        let message = match detail.status {
            HealthStatus::Healthy => "System resources within normal limits".to_string(),
            _ => format!("System resources {}", detail.status),
        };
        ComponentHealth::new("system", detail.status, message, &detail)
    }
}
