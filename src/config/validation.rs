//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::BalancerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyServiceName,
    ZeroRetryDelay,
    MaxDelayBelowBase { base_ms: u64, max_ms: u64 },
    InvalidMetricsAddress(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyServiceName => write!(f, "service_name must not be empty"),
            ValidationError::ZeroRetryDelay => write!(f, "watch.retry.base_delay_ms must be > 0"),
            ValidationError::MaxDelayBelowBase { base_ms, max_ms } => write!(
                f,
                "watch.retry.max_delay_ms ({}) must be >= base_delay_ms ({})",
                max_ms, base_ms
            ),
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "observability.metrics_address '{}' is not a socket address", addr)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check semantic constraints serde cannot express.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    let retry = &config.watch.retry;
    if retry.base_delay_ms == 0 {
        errors.push(ValidationError::ZeroRetryDelay);
    }
    if retry.max_delay_ms < retry.base_delay_ms {
        errors.push(ValidationError::MaxDelayBelowBase {
            base_ms: retry.base_delay_ms,
            max_ms: retry.max_delay_ms,
        });
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
