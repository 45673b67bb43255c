//! Routing-layer boundary.
//!
//! The routing layer owns connection handles. The controller only asks it to
//! create, dial and release them, and hands it a fresh (state, picker) pair
//! after every change.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::balancer::error::{ConnectionError, PickError};
use crate::balancer::picker::{ErrPicker, Picker};
use crate::balancer::registry::ConnectionHandle;
use crate::balancer::state::AggregatedState;
use crate::discovery::Endpoint;

/// Operations the controller consumes from the routing layer.
pub trait RoutingLayer: Send + Sync + 'static {
    type Handle: ConnectionHandle;

    /// Create a managed connection for `endpoint`. Does not dial.
    fn new_connection(&self, endpoint: &Endpoint) -> Result<Self::Handle, ConnectionError>;

    /// Release a handle the controller no longer tracks.
    fn remove_connection(&self, handle: &Self::Handle);

    /// Start dialing a freshly created handle.
    fn begin_connecting(&self, handle: &Self::Handle);

    /// Replace the published aggregated state and picker.
    fn publish_state(&self, state: AggregatedState, picker: Arc<dyn Picker<Self::Handle>>);
}

/// What the routing layer last received from a controller.
#[derive(Debug, Clone)]
pub struct Published<H> {
    pub state: AggregatedState,
    pub picker: Arc<dyn Picker<H>>,
}

/// Lock-free holder of the latest published state.
///
/// A routing layer can embed this and forward `publish_state` to
/// [`PublishedState::store`]; callers on any thread then pick without
/// contending with the controller.
#[derive(Debug)]
pub struct PublishedState<H> {
    current: ArcSwap<Published<H>>,
}

impl<H: ConnectionHandle> PublishedState<H> {
    /// Starts out failing every pick until the first publish.
    pub fn new() -> Self {
        let initial = Published {
            state: AggregatedState::TransientFailure,
            picker: Arc::new(ErrPicker::new(PickError::NoConnectionAvailable)) as Arc<dyn Picker<H>>,
        };
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub fn store(&self, state: AggregatedState, picker: Arc<dyn Picker<H>>) {
        self.current.store(Arc::new(Published { state, picker }));
    }

    pub fn load(&self) -> Arc<Published<H>> {
        self.current.load_full()
    }

    pub fn state(&self) -> AggregatedState {
        self.current.load().state
    }

    /// Pick through the current picker.
    pub fn pick(&self) -> Result<H, PickError> {
        self.current.load().picker.pick()
    }
}

impl<H: ConnectionHandle> Default for PublishedState<H> {
    fn default() -> Self {
        Self::new()
    }
}
