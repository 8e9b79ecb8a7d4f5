//! Error types for the health service

use thiserror::Error;

/// Result type alias for the health service
pub type Result<T> = std::result::Result<T, HealthError>;

/// Main error type for the health service
#[derive(Error, Debug)]
pub enum HealthError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Unknown service or component name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Instrumentation probe errors
    #[error("Probe error: {0}")]
    Probe(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HealthError {
    /// Whether this error represents an unreachable dependency
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            HealthError::Database(_) | HealthError::HttpClient(_) | HealthError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HealthError::Config("missing HOST".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing HOST");

        let err = HealthError::NotFound("no such service: billing".to_string());
        assert_eq!(err.to_string(), "Not found: no such service: billing");
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(HealthError::Timeout("probe".to_string()).is_connectivity());
        assert!(!HealthError::Config("bad".to_string()).is_connectivity());
    }
}
