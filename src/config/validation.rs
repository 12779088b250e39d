//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Check the resource list against what the server can build
//! - Detect duplicate resource registrations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ServerConfig, KNOWN_RESOURCES};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("unknown resource {0:?}")]
    UnknownResource(String),

    #[error("resource {0:?} listed more than once")]
    DuplicateResource(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_connections == Some(0) {
        errors.push(ValidationError::Zero {
            field: "listener.max_connections",
        });
    }
    if config.listener.max_header_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_header_bytes",
        });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero {
            field: "listener.max_body_bytes",
        });
    }
    if config.monitor.interval_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "monitor.interval_secs",
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut seen = HashSet::new();
    for resource in &config.resources {
        let name = resource.to_lowercase();
        if !KNOWN_RESOURCES.contains(&name.as_str()) {
            errors.push(ValidationError::UnknownResource(resource.clone()));
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateResource(resource.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn rejects_bad_bind_address() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "localhost".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::InvalidAddress { field: "listener.bind_address", .. }
        ));
    }

    #[test]
    fn zero_connection_limit_is_rejected() {
        let mut config = ServerConfig::default();
        config.listener.max_connections = Some(0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::Zero { field: "listener.max_connections" }]
        );
    }

    #[test]
    fn resource_names_are_case_insensitive_for_duplicates() {
        let mut config = ServerConfig::default();
        config.resources = vec!["Developers".into(), "developers".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateResource("developers".into())]
        );
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ServerConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
