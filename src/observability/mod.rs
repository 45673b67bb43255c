//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Controller, watcher, provider produce:
//!     → tracing events (structured fields: service, addr, cursor, state)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - The core only emits; installing a subscriber/recorder is opt-in
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::ObservabilityConfig;

/// Failure to install the logging subscriber or metrics recorder.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to install log subscriber: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install logging and, when enabled, the Prometheus exporter.
///
/// The metrics address is checked before anything is installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), InitError> {
    let metrics_addr = if config.metrics_enabled {
        let addr: SocketAddr = config
            .metrics_address
            .parse()
            .map_err(|_| InitError::MetricsAddress(config.metrics_address.clone()))?;
        Some(addr)
    } else {
        None
    };

    logging::init(config)?;
    if let Some(addr) = metrics_addr {
        metrics::init_metrics(addr)?;
    }
    Ok(())
}
