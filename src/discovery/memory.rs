//! In-process membership provider with long-poll semantics.
//!
//! Every `set_endpoints` bumps a global index, like a catalog's raft index.
//! A query with cursor 0, or with a cursor that no longer matches the
//! service's index, returns at once; otherwise it parks until the service
//! changes or `max_wait` elapses.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

use crate::balancer::error::ProviderError;
use crate::discovery::{Endpoint, MembershipProvider, Snapshot};

#[derive(Debug, Clone, Default)]
struct ServiceEntry {
    index: u64,
    endpoints: Vec<Endpoint>,
}

/// Membership held in memory, mutated by the embedding application.
#[derive(Debug)]
pub struct MemoryProvider {
    max_wait: Duration,
    bootstrap: RwLock<Option<String>>,
    services: DashMap<String, ServiceEntry>,
    /// Latest global index; receivers wake on every bump.
    changes: watch::Sender<u64>,
}

impl MemoryProvider {
    pub fn new(max_wait: Duration) -> Self {
        let (changes, _) = watch::channel(1);
        Self {
            max_wait,
            bootstrap: RwLock::new(None),
            services: DashMap::new(),
            changes,
        }
    }

    /// Replace the endpoint list of `service` and return its new index.
    pub fn set_endpoints(&self, service: &str, endpoints: Vec<Endpoint>) -> u64 {
        let mut index = 0;
        self.changes.send_modify(|global| {
            *global += 1;
            index = *global;
            self.services
                .insert(service.to_string(), ServiceEntry { index, endpoints });
        });
        tracing::debug!(service = %service, index, "Membership updated");
        index
    }

    /// Address passed to the last successful `connect`.
    pub fn bootstrap_addr(&self) -> Option<String> {
        self.bootstrap.read().ok().and_then(|addr| addr.clone())
    }

    fn is_connected(&self) -> bool {
        self.bootstrap.read().map(|addr| addr.is_some()).unwrap_or(false)
    }

    fn current(&self, service: &str) -> Snapshot {
        match self.services.get(service) {
            Some(entry) => Snapshot {
                endpoints: entry.endpoints.clone(),
                index: entry.index,
            },
            None => Snapshot {
                endpoints: Vec::new(),
                index: *self.changes.borrow(),
            },
        }
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[async_trait]
impl MembershipProvider for MemoryProvider {
    async fn endpoints(&self, service: &str, cursor: u64) -> Result<Snapshot, ProviderError> {
        if !self.is_connected() {
            return Err(ProviderError::NotConnected);
        }

        // Subscribe before reading so a change between the two is not lost.
        let mut rx = self.changes.subscribe();
        let snapshot = self.current(service);
        if cursor == 0 || snapshot.index != cursor {
            return Ok(snapshot);
        }

        let waited = tokio::time::timeout(self.max_wait, async {
            loop {
                if rx.changed().await.is_err() {
                    return;
                }
                if self.current(service).index != cursor {
                    return;
                }
            }
        })
        .await;
        if waited.is_err() {
            tracing::trace!(service = %service, cursor, "Long-poll wait elapsed without change");
        }

        Ok(self.current(service))
    }

    async fn connect(&self, addr: &str) -> Result<(), ProviderError> {
        if addr.trim().is_empty() {
            return Err(ProviderError::Connect {
                addr: addr.to_string(),
                reason: "empty bootstrap address".to_string(),
            });
        }
        match self.bootstrap.write() {
            Ok(mut bootstrap) => {
                *bootstrap = Some(addr.to_string());
                Ok(())
            }
            Err(_) => Err(ProviderError::Connect {
                addr: addr.to_string(),
                reason: "provider state poisoned".to_string(),
            }),
        }
    }
}
