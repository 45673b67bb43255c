//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! resolve(addrs)
//!     → provider connect + bootstrap snapshot
//!     → routing.new_connection per endpoint → registry.rs (Idle) → begin_connecting
//!     → watcher started once
//!
//! on_connection_state_change(handle, state)
//!     → registry.rs (prev state, write new)
//!     → state.rs transition table (keep / evict)
//!     → aggregate.rs + picker.rs (rebuilt from snapshot)
//!     → routing.publish_state
//! ```
//!
//! # Design Decisions
//! - The registry is the only mutable shared state
//! - Aggregated state is always recomputed, never stored
//! - Pickers are immutable snapshots; a change builds a new one
//! - Selection policy is pluggable, round robin by default

pub mod aggregate;
pub mod builder;
pub mod controller;
pub mod error;
pub mod picker;
pub mod registry;
pub mod routing;
pub mod state;

pub use builder::BalancerBuilder;
pub use controller::Balancer;
pub use error::{ConnectionError, PickError, ProviderError, ResolveError};
pub use picker::{Picker, PickerBuilder, RoundRobin};
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use routing::{PublishedState, RoutingLayer};
pub use state::{AggregatedState, HealthState};
