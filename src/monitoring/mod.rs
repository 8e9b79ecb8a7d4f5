//! Health monitoring
//!
//! Seven leaf services (system, database, external, application,
//! performance, cache, security) composed by [`HealthService`], which the
//! HTTP layer queries and instruments.

pub mod aggregator;
pub mod application;
pub mod cache;
pub mod database;
pub mod external;
pub mod performance;
pub mod security;
pub mod system;
pub mod types;
pub mod window;

pub use aggregator::{BasicHealth, HealthService};
pub use application::ApplicationHealthService;
pub use cache::CacheHealthService;
pub use database::{DatabaseHealthService, DatabaseProbe, SeaOrmProbe};
pub use external::ExternalServicesHealthService;
pub use performance::PerformanceHealthService;
pub use security::SecurityHealthService;
pub use system::SystemHealthService;
pub use types::{
    Alert, AlertSeverity, ComponentHealth, ComprehensiveHealthReport, HealthStatus, HealthSummary,
    StatusSummary,
};
