//! Error types for the balancing core.
//!
//! Nothing here is fatal: every variant is logged and degrades to "keep
//! trying" or "serve nothing for now".

use thiserror::Error;

/// Failure reported by a membership provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// `endpoints` was called before a successful `connect`.
    #[error("membership provider is not connected")]
    NotConnected,

    /// Bootstrap handshake with the provider failed.
    #[error("failed to connect to membership provider at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    /// An endpoint query failed.
    #[error("endpoint query for service '{service}' failed: {reason}")]
    Fetch { service: String, reason: String },
}

/// The routing layer refused to create a connection for an endpoint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to open connection to {addr}: {reason}")]
pub struct ConnectionError {
    pub addr: String,
    pub reason: String,
}

/// Returned by a picker that has nothing to serve.
///
/// This is a retry signal for the routing layer, not a failure of the call.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum PickError {
    #[error("no connection available, try again")]
    NoConnectionAvailable,
}

/// Failure delivered alongside a resolver update.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("address resolution failed: {0}")]
pub struct ResolveError(pub String);

