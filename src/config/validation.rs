//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject malformed backend addresses before anything is bound
//! - Validate value ranges (timeouts > 0, capacities > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::BalancerConfig;
use crate::load_balancer::backend::{BackendEndpoint, EndpointError};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,
    #[error("backend #{index}: {source}")]
    InvalidBackend { index: usize, source: EndpointError },
    #[error("{field}: invalid socket address `{value}`")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{field} must start with '/': `{value}`")]
    InvalidPath { field: &'static str, value: String },
    #[error("{field} must be a literal path without `:`, `*`, `{{` or `}}`: `{value}`")]
    PatternPath { field: &'static str, value: String },
    #[error("ingest and summary routes share the path `{0}`")]
    ConflictingRoutes(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let backends = config.backends.as_slice();
    if backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for (index, address) in backends.iter().enumerate() {
        if let Err(source) = BackendEndpoint::parse(address) {
            errors.push(ValidationError::InvalidBackend { index, source });
        }
    }

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let positive = [
        ("listener.read_timeout_secs", config.listener.read_timeout_secs),
        ("listener.write_timeout_secs", config.listener.write_timeout_secs),
        ("listener.idle_timeout_secs", config.listener.idle_timeout_secs),
        ("listener.max_connections", config.listener.max_connections as u64),
        ("pipeline.queue_capacity", config.pipeline.queue_capacity as u64),
        ("pipeline.workers", config.pipeline.workers as u64),
        ("pipeline.dispatch_timeout_ms", config.pipeline.dispatch_timeout_ms),
        ("transport.connect_timeout_secs", config.transport.connect_timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let routes = &config.routes;
    check_path(&mut errors, "routes.ingest_path", &routes.ingest_path);
    check_path(&mut errors, "routes.summary_path", &routes.summary_path);
    if routes.ingest_path == routes.summary_path {
        errors.push(ValidationError::ConflictingRoutes(routes.ingest_path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Routes are matched literally; the router treats these characters as
/// captures or wildcards and rejects malformed ones at registration.
const ROUTE_PATTERN_CHARS: [char; 4] = [':', '*', '{', '}'];

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            field,
            value: value.to_string(),
        });
    } else if value.contains(ROUTE_PATTERN_CHARS) {
        errors.push(ValidationError::PatternPath {
            field,
            value: value.to_string(),
        });
    }
}
