//! Shared utilities
//!
//! This module provides error handling used across the service.

pub mod error;

pub use error::{HealthError, Result};
