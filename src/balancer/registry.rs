//! Connection registry.
//!
//! # Responsibilities
//! - Map each live connection handle to exactly one health state
//! - Default unseen handles to `Idle` on first read
//! - Hand out point-in-time snapshots for aggregation and picking
//!
//! # Design Decisions
//! - Sharded concurrent map; no lock is held across calls
//! - Reads never report a missing handle, they insert `Idle` instead
//! - Writes to one handle are ordered by the caller's event stream

use std::fmt::Debug;
use std::hash::Hash;

use dashmap::DashMap;

use crate::balancer::state::HealthState;

/// Opaque identity of one managed connection.
///
/// `Ord` gives pickers a stable iteration order across rebuilds.
pub trait ConnectionHandle: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> ConnectionHandle for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

/// Point-in-time view of the registry, sorted by handle.
pub type RegistrySnapshot<H> = Vec<(H, HealthState)>;

/// Concurrent handle → state store.
#[derive(Debug)]
pub struct ConnectionRegistry<H: ConnectionHandle> {
    states: DashMap<H, HealthState>,
}

impl<H: ConnectionHandle> ConnectionRegistry<H> {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    /// Upsert the state of `handle`.
    pub fn set_state(&self, handle: H, state: HealthState) {
        self.states.insert(handle, state);
    }

    /// Current state of `handle`, inserting `Idle` if it was never seen.
    pub fn get_state(&self, handle: &H) -> HealthState {
        if let Some(state) = self.states.get(handle) {
            return *state;
        }
        *self.states.entry(handle.clone()).or_insert(HealthState::Idle)
    }

    /// Remove `handle`. Removing an absent handle is a no-op.
    pub fn delete(&self, handle: &H) {
        self.states.remove(handle);
    }

    /// Whether `handle` currently has an entry, without inserting one.
    pub fn contains(&self, handle: &H) -> bool {
        self.states.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Copy out every entry. Not atomic across keys: a concurrent write to one
    /// handle may or may not be reflected.
    pub fn snapshot(&self) -> RegistrySnapshot<H> {
        let mut entries: RegistrySnapshot<H> = self
            .states
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

impl<H: ConnectionHandle> Default for ConnectionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
