//! Balancer controller.
//!
//! # Responsibilities
//! - Bootstrap connections from the first resolved address
//! - Start the membership watcher once per controller
//! - Apply connection state changes and the eviction table
//! - Republish (aggregated state, picker) after every change
//!
//! # Lifecycle
//! ```text
//! Active ──close()──▶ Closed (terminal: events ignored, tasks stopped)
//! ```
//!
//! The routing layer delivers `resolve` and `on_connection_state_change`
//! serially for one controller; published pickers are read concurrently from
//! any thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::balancer::aggregate::aggregate;
use crate::balancer::error::ResolveError;
use crate::balancer::picker::{build_picker, PickerBuilder};
use crate::balancer::registry::ConnectionRegistry;
use crate::balancer::routing::RoutingLayer;
use crate::balancer::state::{transition, Disposition, HealthState};
use crate::discovery::watcher::Watcher;
use crate::discovery::{Endpoint, MembershipProvider};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;

struct Inner<P, R: RoutingLayer> {
    service: String,
    provider: Arc<P>,
    routing: Arc<R>,
    registry: ConnectionRegistry<R::Handle>,
    strategy: Arc<dyn PickerBuilder<R::Handle>>,
    backoff: Backoff,
    shutdown: Shutdown,
    watching: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Balancing state machine for one service name.
///
/// Cheap to clone; clones share state. Background tasks only hold a weak
/// reference, so dropping every clone also stops them.
pub struct Balancer<P, R: RoutingLayer> {
    inner: Arc<Inner<P, R>>,
}

impl<P, R: RoutingLayer> Clone for Balancer<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<P: MembershipProvider, R: RoutingLayer> Balancer<P, R> {
    pub(crate) fn new(
        service: String,
        provider: Arc<P>,
        routing: Arc<R>,
        strategy: Arc<dyn PickerBuilder<R::Handle>>,
        backoff: Backoff,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                service,
                provider,
                routing,
                registry: ConnectionRegistry::new(),
                strategy,
                backoff,
                shutdown: Shutdown::new(),
                watching: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service
    }

    /// Registry of tracked handles.
    pub fn registry(&self) -> &ConnectionRegistry<R::Handle> {
        &self.inner.registry
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shutdown.is_triggered()
    }

    /// Handle a resolver update.
    ///
    /// Connects the provider to the first address, opens a connection per
    /// endpoint of the current snapshot and starts the watcher (once). Every
    /// failure is logged and aborts only this attempt. A `close` that lands
    /// while either provider call is pending stops the attempt once it returns.
    pub async fn resolve(&self, resolved: Result<Vec<Endpoint>, ResolveError>) {
        let service = &self.inner.service;
        if self.is_closed() {
            tracing::debug!(service = %service, "Resolve after close ignored");
            return;
        }

        let addrs = match resolved {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::info!(service = %service, error = %e, "Resolve called with error");
                return;
            }
        };
        let Some(bootstrap) = addrs.first() else {
            tracing::error!(service = %service, "Resolve called with no addresses");
            return;
        };

        if let Err(e) = self.inner.provider.connect(&bootstrap.addr).await {
            tracing::error!(
                service = %service,
                addr = %bootstrap.addr,
                error = %e,
                "Failed to connect to membership provider"
            );
            return;
        }
        if self.is_closed() {
            tracing::debug!(service = %service, "Closed while connecting to provider");
            return;
        }

        let fetched = self.inner.provider.endpoints(service, 0).await;
        if self.is_closed() {
            tracing::debug!(service = %service, "Closed during bootstrap fetch; snapshot dropped");
            return;
        }

        match fetched {
            Ok(snapshot) => {
                if snapshot.endpoints.is_empty() {
                    tracing::warn!(service = %service, "Provider has no endpoints. Waiting...");
                }
                tracing::info!(
                    service = %service,
                    endpoints = snapshot.endpoints.len(),
                    cursor = snapshot.index,
                    "Bootstrap snapshot received"
                );
                self.open_connections(&snapshot.endpoints);
            }
            Err(e) => {
                tracing::error!(service = %service, error = %e, "Bootstrap endpoint fetch failed");
            }
        }

        self.start_watcher();
    }

    /// Open connections for endpoints delivered by the watcher.
    ///
    /// Addresses already connected are not deduplicated.
    pub fn on_new_endpoints(&self, endpoints: Vec<Endpoint>) {
        if self.is_closed() {
            tracing::debug!(service = %self.inner.service, "Endpoints after close dropped");
            return;
        }
        self.open_connections(&endpoints);
    }

    /// Apply a connection state change and republish.
    pub fn on_connection_state_change(&self, handle: R::Handle, state: HealthState) {
        let inner = &self.inner;
        if self.is_closed() {
            tracing::debug!(service = %inner.service, handle = ?handle, %state, "State change after close ignored");
            return;
        }

        let prev = inner.registry.get_state(&handle);
        inner.registry.set_state(handle.clone(), state);
        tracing::debug!(service = %inner.service, handle = ?handle, from = %prev, to = %state, "Connection state changed");

        if transition(prev, state) == Disposition::Evict {
            inner.registry.delete(&handle);
            inner.routing.remove_connection(&handle);
            metrics::record_eviction(&inner.service);
            tracing::info!(service = %inner.service, handle = ?handle, from = %prev, to = %state, "Connection evicted");
        }

        self.republish();
    }

    /// Stop the watcher and refuse further events.
    ///
    /// Call once. Tasks are signalled, not joined; see
    /// [`Balancer::wait_watcher_stopped`].
    pub fn close(&self) {
        if self.inner.shutdown.is_triggered() {
            tracing::warn!(service = %self.inner.service, "Balancer closed twice");
        }
        self.inner.shutdown.trigger();
        tracing::info!(service = %self.inner.service, "Balancer closed");
    }

    /// Wait for the watcher tasks to exit. Returns immediately if none ran.
    pub async fn wait_watcher_stopped(&self) {
        let tasks = match self.inner.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(service = %self.inner.service, error = %e, "Watcher task failed");
            }
        }
    }

    fn open_connections(&self, endpoints: &[Endpoint]) {
        let inner = &self.inner;
        for endpoint in endpoints {
            if self.is_closed() {
                tracing::debug!(service = %inner.service, addr = %endpoint.addr, "Closed; remaining endpoints dropped");
                return;
            }
            let handle = match inner.routing.new_connection(endpoint) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(service = %inner.service, addr = %endpoint.addr, error = %e, "Failed to open connection");
                    continue;
                }
            };
            inner.registry.set_state(handle.clone(), HealthState::Idle);
            if self.is_closed() {
                // close raced the dial; hand the handle straight back
                inner.registry.delete(&handle);
                inner.routing.remove_connection(&handle);
                return;
            }
            inner.routing.begin_connecting(&handle);
            metrics::record_connection_opened(&inner.service);
            tracing::debug!(service = %inner.service, addr = %endpoint.addr, handle = ?handle, "Connection opened");
        }
    }

    fn republish(&self) {
        let inner = &self.inner;
        let snapshot = inner.registry.snapshot();
        let state = aggregate(snapshot.iter().map(|(_, s)| s));
        let ready = snapshot.iter().filter(|(_, s)| *s == HealthState::Ready).count();
        let picker = build_picker(&snapshot, inner.strategy.as_ref());

        metrics::record_republish(&inner.service, state, ready);
        inner.routing.publish_state(state, picker);
    }

    fn start_watcher(&self) {
        let inner = &self.inner;
        if self.is_closed() || inner.watching.swap(true, Ordering::SeqCst) {
            return;
        }

        let (tx, mut rx) = mpsc::channel::<Vec<Endpoint>>(1);
        let watcher = Watcher::new(inner.service.clone(), inner.provider.clone(), inner.backoff);
        let fetch = tokio::spawn(watcher.run(tx, inner.shutdown.subscribe()));

        let weak: Weak<Inner<P, R>> = Arc::downgrade(&self.inner);
        let mut shutdown = inner.shutdown.subscribe();
        let consume = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => break,
                    next = rx.recv() => {
                        let Some(endpoints) = next else { break };
                        let Some(inner) = weak.upgrade() else { break };
                        Balancer { inner }.on_new_endpoints(endpoints);
                    }
                }
            }
        });

        match inner.tasks.lock() {
            Ok(mut tasks) => tasks.extend([fetch, consume]),
            Err(poisoned) => poisoned.into_inner().extend([fetch, consume]),
        }
        tracing::info!(service = %inner.service, "Membership watch started");
    }
}
