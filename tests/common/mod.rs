//! Shared fakes for controller and watcher tests.
#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;
use dyn_balancer::balancer::error::{ConnectionError, ProviderError};
use dyn_balancer::balancer::picker::Picker;
use dyn_balancer::balancer::routing::PublishedState;
use dyn_balancer::{AggregatedState, Endpoint, MembershipProvider, RoutingLayer, Snapshot};

/// Routing layer that hands out `u64` handles and records every call.
#[derive(Default)]
pub struct RecordingRouting {
    next_handle: AtomicU64,
    created: Mutex<Vec<(u64, String)>>,
    removed: Mutex<Vec<u64>>,
    connecting: Mutex<Vec<u64>>,
    states: Mutex<Vec<AggregatedState>>,
    refused: Mutex<HashSet<String>>,
    publish_count: AtomicUsize,
    pub published: PublishedState<u64>,
}

impl RecordingRouting {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `new_connection` fail for `addr`.
    pub fn refuse(&self, addr: &str) {
        self.refused.lock().unwrap().insert(addr.to_string());
    }

    pub fn created(&self) -> Vec<(u64, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_addrs(&self) -> Vec<String> {
        self.created().into_iter().map(|(_, addr)| addr).collect()
    }

    pub fn handles(&self) -> Vec<u64> {
        self.created().into_iter().map(|(h, _)| h).collect()
    }

    pub fn removed(&self) -> Vec<u64> {
        self.removed.lock().unwrap().clone()
    }

    pub fn connecting(&self) -> Vec<u64> {
        self.connecting.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<AggregatedState> {
        self.states.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.publish_count.load(Ordering::SeqCst)
    }
}

impl RoutingLayer for RecordingRouting {
    type Handle = u64;

    fn new_connection(&self, endpoint: &Endpoint) -> Result<u64, ConnectionError> {
        if self.refused.lock().unwrap().contains(&endpoint.addr) {
            return Err(ConnectionError {
                addr: endpoint.addr.clone(),
                reason: "refused by test".into(),
            });
        }
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        self.created.lock().unwrap().push((handle, endpoint.addr.clone()));
        Ok(handle)
    }

    fn remove_connection(&self, handle: &u64) {
        self.removed.lock().unwrap().push(*handle);
    }

    fn begin_connecting(&self, handle: &u64) {
        self.connecting.lock().unwrap().push(*handle);
    }

    fn publish_state(&self, state: AggregatedState, picker: Arc<dyn Picker<u64>>) {
        self.states.lock().unwrap().push(state);
        self.publish_count.fetch_add(1, Ordering::SeqCst);
        self.published.store(state, picker);
    }
}

/// Provider that replays a fixed script of fetch results, then parks
/// forever like a long-poll with nothing new to report.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Snapshot, ProviderError>>>,
    cursors: Mutex<Vec<u64>>,
    connects: Mutex<Vec<String>>,
    connect_error: Mutex<Option<ProviderError>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Snapshot, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn fail_connect(&self, err: ProviderError) {
        *self.connect_error.lock().unwrap() = Some(err);
    }

    pub fn push(&self, next: Result<Snapshot, ProviderError>) {
        self.script.lock().unwrap().push_back(next);
    }

    /// Cursor passed on every `endpoints` call, in order.
    pub fn cursors(&self) -> Vec<u64> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl MembershipProvider for ScriptedProvider {
    async fn endpoints(&self, _service: &str, cursor: u64) -> Result<Snapshot, ProviderError> {
        self.cursors.lock().unwrap().push(cursor);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(res) => res,
            None => std::future::pending().await,
        }
    }

    async fn connect(&self, addr: &str) -> Result<(), ProviderError> {
        self.connects.lock().unwrap().push(addr.to_string());
        match self.connect_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Provider whose fetches past the first `ungated` calls block until
/// `release`, then all return the same snapshot.
pub struct GatedProvider {
    snapshot: Snapshot,
    ungated: usize,
    calls: AtomicUsize,
    gate: watch::Sender<bool>,
}

impl GatedProvider {
    pub fn new(snapshot: Snapshot, ungated: usize) -> Arc<Self> {
        let (gate, _) = watch::channel(false);
        Arc::new(Self {
            snapshot,
            ungated,
            calls: AtomicUsize::new(0),
            gate,
        })
    }

    /// Let every held and future fetch return.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Fetches started so far, held or not.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipProvider for GatedProvider {
    async fn endpoints(&self, _service: &str, _cursor: u64) -> Result<Snapshot, ProviderError> {
        let mut open = self.gate.subscribe();
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.ungated {
            let _ = open.wait_for(|released| *released).await;
        }
        Ok(self.snapshot.clone())
    }

    async fn connect(&self, _addr: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

pub fn snapshot(addrs: &[&str], index: u64) -> Snapshot {
    Snapshot {
        endpoints: addrs.iter().map(|a| Endpoint::new(*a)).collect(),
        index,
    }
}

pub fn fetch_error() -> ProviderError {
    ProviderError::Fetch {
        service: "svc".into(),
        reason: "agent unreachable".into(),
    }
}

/// Poll `cond` until it holds or `timeout` passes.
pub async fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
