//! Client-side dynamic load balancing core for RPC connections.
//!
//! Tracks the health of every connection to a named service, follows the
//! service's membership through a pluggable long-poll provider, and publishes
//! an aggregated state plus a picker to the routing layer after every change.

pub mod balancer;
pub mod config;
pub mod discovery;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use balancer::{Balancer, BalancerBuilder, HealthState, AggregatedState, RoutingLayer};
pub use config::BalancerConfig;
pub use discovery::{Endpoint, MembershipProvider, Snapshot};
pub use lifecycle::Shutdown;
