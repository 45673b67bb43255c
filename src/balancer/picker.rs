//! Pickers: immutable selectors over the connections that were `Ready` when
//! they were built.
//!
//! # Design Decisions
//! - A picker never changes after construction; the controller replaces it
//!   wholesale on every registry change
//! - Selection policy is a `PickerBuilder` so alternate strategies can be
//!   installed without touching the registry or aggregation
//! - Round robin is the only policy shipped

use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::balancer::error::PickError;
use crate::balancer::registry::{ConnectionHandle, RegistrySnapshot};
use crate::balancer::state::HealthState;

/// Yields the connection to use for the next outgoing call.
pub trait Picker<H>: Debug + Send + Sync {
    fn pick(&self) -> Result<H, PickError>;
}

/// Selection strategy: turns the current `Ready` set into a picker.
///
/// `ready` is never empty; the empty case is handled by [`build_picker`].
pub trait PickerBuilder<H: ConnectionHandle>: Debug + Send + Sync {
    fn build(&self, ready: Vec<H>) -> Arc<dyn Picker<H>>;
}

/// Build a picker from a registry snapshot using `strategy`.
pub fn build_picker<H: ConnectionHandle>(
    snapshot: &RegistrySnapshot<H>,
    strategy: &dyn PickerBuilder<H>,
) -> Arc<dyn Picker<H>> {
    let ready: Vec<H> = snapshot
        .iter()
        .filter(|(_, state)| *state == HealthState::Ready)
        .map(|(handle, _)| handle.clone())
        .collect();

    if ready.is_empty() {
        return Arc::new(ErrPicker::new(PickError::NoConnectionAvailable));
    }
    strategy.build(ready)
}

/// Picker that fails every pick with a fixed error.
#[derive(Debug, Clone, Copy)]
pub struct ErrPicker {
    err: PickError,
}

impl ErrPicker {
    pub fn new(err: PickError) -> Self {
        Self { err }
    }
}

impl<H> Picker<H> for ErrPicker {
    fn pick(&self) -> Result<H, PickError> {
        Err(self.err)
    }
}

/// Round-robin selector.
/// Stores an internal counter to rotate through a fixed list of handles.
#[derive(Debug)]
pub struct RoundRobinPicker<H> {
    handles: Vec<H>,
    counter: AtomicUsize,
}

impl<H> RoundRobinPicker<H> {
    pub fn new(handles: Vec<H>) -> Self {
        Self {
            handles,
            counter: AtomicUsize::new(0),
        }
    }
}

impl<H: Clone + Debug + Send + Sync> Picker<H> for RoundRobinPicker<H> {
    fn pick(&self) -> Result<H, PickError> {
        if self.handles.is_empty() {
            return Err(PickError::NoConnectionAvailable);
        }

        // fetch_add hands every concurrent caller its own slot
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.handles.len();
        Ok(self.handles[index].clone())
    }
}

/// Default strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobin;

impl RoundRobin {
    pub fn new() -> Self {
        Self
    }
}

impl<H: ConnectionHandle> PickerBuilder<H> for RoundRobin {
    fn build(&self, ready: Vec<H>) -> Arc<dyn Picker<H>> {
        Arc::new(RoundRobinPicker::new(ready))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_round_robin() {
        let picker = RoundRobinPicker::new(vec!["a", "b", "c"]);
        let picks: Vec<&str> = (0..5).map(|_| picker.pick().unwrap()).collect();

        assert_eq!(picks, vec!["a", "b", "c", "a", "b"]);
    }

    #[test]
    fn test_empty_snapshot_builds_err_picker() {
        let snapshot: RegistrySnapshot<u32> = vec![(1, HealthState::Connecting), (2, HealthState::Idle)];
        let picker = build_picker(&snapshot, &RoundRobin);

        for _ in 0..3 {
            assert_eq!(picker.pick(), Err(PickError::NoConnectionAvailable));
        }
    }

    #[test]
    fn test_only_ready_handles_are_served() {
        let snapshot: RegistrySnapshot<u32> = vec![
            (1, HealthState::Ready),
            (2, HealthState::TransientFailure),
            (3, HealthState::Ready),
            (4, HealthState::Connecting),
        ];
        let picker = build_picker(&snapshot, &RoundRobin);

        let picks: Vec<u32> = (0..4).map(|_| picker.pick().unwrap()).collect();
        assert_eq!(picks, vec![1, 3, 1, 3]);
    }

    #[test]
    fn test_concurrent_picks_spread_evenly() {
        let picker = Arc::new(RoundRobinPicker::new(vec![0u32, 1, 2, 3]));
        let mut threads = Vec::new();

        for _ in 0..4 {
            let picker = picker.clone();
            threads.push(std::thread::spawn(move || {
                (0..1000).map(|_| picker.pick().unwrap()).collect::<Vec<u32>>()
            }));
        }

        let mut counts: HashMap<u32, usize> = HashMap::new();
        for t in threads {
            for h in t.join().unwrap() {
                *counts.entry(h).or_default() += 1;
            }
        }

        // 4000 atomic slots over 4 handles land exactly 1000 on each
        for h in 0..4 {
            assert_eq!(counts[&h], 1000);
        }
    }
}
