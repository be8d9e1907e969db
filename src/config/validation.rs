//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, worker slots > 0)
//! - Reject static roots that escape the search path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.workers == Some(0) {
        errors.push(ValidationError::new("listener.workers", "must be at least 1"));
    }
    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }

    if config.timeouts.read_ms == 0 {
        errors.push(ValidationError::new("timeouts.read_ms", "must be greater than 0"));
    }
    if config.timeouts.shutdown_grace_ms == 0 {
        errors.push(ValidationError::new(
            "timeouts.shutdown_grace_ms",
            "must be greater than 0",
        ));
    }
    if config.timeouts.shutdown_force_ms == 0 {
        errors.push(ValidationError::new(
            "timeouts.shutdown_force_ms",
            "must be greater than 0",
        ));
    }

    if config.static_files.root.split('/').any(|part| part == "..") {
        errors.push(ValidationError::new(
            "static_files.root",
            "must not contain '..'",
        ));
    }
    if config.static_files.search_path.is_empty() {
        errors.push(ValidationError::new(
            "static_files.search_path",
            "needs at least one directory",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
