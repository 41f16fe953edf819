//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Detect conflicting listen addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ControllerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;
use thiserror::Error;

use crate::config::schema::ControllerConfig;
use crate::observability::logging::parse_level;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be 0")]
    ZeroPort { field: &'static str },

    #[error("listen_host {0:?} is not an IP address")]
    InvalidHost(String),

    #[error("listen_port and debug_server_port are both {0} on an overlapping address")]
    PortConflict(u16),

    #[error("{field} must not be empty")]
    EmptyPath { field: &'static str },

    #[error("{field} must be greater than 0")]
    ZeroTimeout { field: &'static str },

    #[error("log_level {0:?} is not a known level")]
    InvalidLogLevel(String),
}

pub fn validate_config(config: &ControllerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listen_port == 0 {
        errors.push(ValidationError::ZeroPort {
            field: "listen_port",
        });
    }
    if config.debug_server_port == 0 {
        errors.push(ValidationError::ZeroPort {
            field: "debug_server_port",
        });
    }

    match config.listen_host.parse::<IpAddr>() {
        Ok(host) => {
            // The debug server always binds 127.0.0.1.
            let overlaps = host.is_loopback() || host.is_unspecified();
            if overlaps && config.listen_port != 0 && config.listen_port == config.debug_server_port {
                errors.push(ValidationError::PortConflict(config.listen_port));
            }
        }
        Err(_) => errors.push(ValidationError::InvalidHost(config.listen_host.clone())),
    }

    for (field, value) in [
        ("ca_cert_file", &config.ca_cert_file),
        ("server_cert_file", &config.server_cert_file),
        ("server_key_file", &config.server_key_file),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::EmptyPath { field });
        }
    }

    if config.drain_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "drain_timeout_secs",
        });
    }
    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout {
            field: "request_timeout_secs",
        });
    }
    if config.shutdown_deadline_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout {
            field: "shutdown_deadline_secs",
        });
    }

    if parse_level(&config.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
