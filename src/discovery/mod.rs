//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Controller resolve:
//!     provider.connect(bootstrap addr)
//!     → provider.endpoints(service, 0)      (immediate snapshot)
//!
//! watcher.rs (long-poll loop):
//!     provider.endpoints(service, cursor)   (blocks until change or max wait)
//!     → non-empty: send endpoints downstream, cursor = snapshot.index
//!     → empty:     warn, poll again
//!     → error:     warn, back off, retry same cursor
//! ```
//!
//! # Design Decisions
//! - Providers are pluggable behind `MembershipProvider`
//! - Cursor 0 always means "current state, don't block"
//! - Endpoints are immutable once returned

pub mod memory;
pub mod watcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::balancer::error::ProviderError;

/// A resolved address plus optional tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Endpoint {
    /// Address in `host:port` form.
    pub addr: String,

    /// Free-form metadata attached by the provider.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Endpoint {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Endpoint list plus the cursor to pass on the next call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub endpoints: Vec<Endpoint>,
    pub index: u64,
}

/// Source of membership for a service name.
#[async_trait]
pub trait MembershipProvider: Send + Sync + 'static {
    /// Endpoints for `service` newer than `cursor`.
    ///
    /// With `cursor == 0` this returns immediately. Otherwise it may block
    /// until membership changes or a provider-defined wait elapses.
    async fn endpoints(&self, service: &str, cursor: u64) -> Result<Snapshot, ProviderError>;

    /// One-time handshake that enables `endpoints`.
    async fn connect(&self, addr: &str) -> Result<(), ProviderError>;
}
