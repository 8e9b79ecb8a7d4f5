//! Configuration data models
//!
//! This module defines all configuration structures used by the health service.

pub mod database;
pub mod external;
pub mod monitoring;
pub mod server;
pub mod thresholds;

// Re-export all configuration types
pub use database::*;
pub use external::*;
pub use monitoring::*;
pub use server::*;
pub use thresholds::*;

/// Default server host
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8080
}

/// Default external probe timeout in milliseconds
pub fn default_probe_timeout_ms() -> u64 {
    5000
}

/// Default expected HTTP status for external probes
pub fn default_expected_status() -> u16 {
    200
}

/// Default TTL for cached external probe results, in seconds
pub fn default_probe_cache_ttl_secs() -> u64 {
    30
}
