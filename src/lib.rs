//! # healthgate
//!
//! Health aggregation service for a wagering platform. Seven leaf checks
//! (system, database, external dependencies, application, performance,
//! cache, security) roll up into one comprehensive report with alerts and
//! recommendations, served over HTTP alongside a Prometheus exposition.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     healthgate::server::run_server().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod monitoring;
pub mod server;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use monitoring::{ComprehensiveHealthReport, HealthService, HealthStatus};
pub use utils::error::{HealthError, Result};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
