//! Connection health states and the eviction transition table.
//!
//! # State Transitions
//! ```text
//! any       → Shutdown:          evict
//! Connecting → TransientFailure: keep (transport retries the dial)
//! other     → TransientFailure:  evict
//! any       → anything else:     keep
//! ```

use std::fmt;

/// Health state of a single managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HealthState {
    #[default]
    Idle,
    Connecting,
    Ready,
    TransientFailure,
    Shutdown,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthState::Idle => "IDLE",
            HealthState::Connecting => "CONNECTING",
            HealthState::Ready => "READY",
            HealthState::TransientFailure => "TRANSIENT_FAILURE",
            HealthState::Shutdown => "SHUTDOWN",
        };
        f.write_str(s)
    }
}

/// Health summary over every connection of one balancer.
///
/// There is no idle aggregate: an all-idle registry reports `TransientFailure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregatedState {
    Ready,
    Connecting,
    TransientFailure,
}

impl fmt::Display for AggregatedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AggregatedState::Ready => "READY",
            AggregatedState::Connecting => "CONNECTING",
            AggregatedState::TransientFailure => "TRANSIENT_FAILURE",
        };
        f.write_str(s)
    }
}

/// What the controller does with a handle after applying a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Keep the handle registered.
    Keep,
    /// Drop it from the registry and release it to the routing layer.
    Evict,
}

/// Decide whether a connection survives the move from `prev` to `next`.
pub fn transition(prev: HealthState, next: HealthState) -> Disposition {
    use HealthState::*;

    match (prev, next) {
        (_, Shutdown) => Disposition::Evict,
        (Connecting, TransientFailure) => Disposition::Keep,
        (_, TransientFailure) => Disposition::Evict,
        _ => Disposition::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HealthState::*;

    const ALL: [HealthState; 5] = [Idle, Connecting, Ready, TransientFailure, Shutdown];

    #[test]
    fn test_shutdown_always_evicts() {
        for prev in ALL {
            assert_eq!(transition(prev, Shutdown), Disposition::Evict, "prev = {prev}");
        }
    }

    #[test]
    fn test_transient_failure_while_connecting_is_kept() {
        assert_eq!(transition(Connecting, TransientFailure), Disposition::Keep);
    }

    #[test]
    fn test_transient_failure_from_other_states_evicts() {
        for prev in [Idle, Ready, TransientFailure, Shutdown] {
            assert_eq!(transition(prev, TransientFailure), Disposition::Evict, "prev = {prev}");
        }
    }

    #[test]
    fn test_non_failure_states_are_kept() {
        for prev in ALL {
            for next in [Idle, Connecting, Ready] {
                assert_eq!(transition(prev, next), Disposition::Keep);
            }
        }
    }

    #[test]
    fn test_unknown_handle_state_defaults_to_idle() {
        assert_eq!(HealthState::default(), Idle);
        assert_eq!(Idle.to_string(), "IDLE");
        assert_eq!(TransientFailure.to_string(), "TRANSIENT_FAILURE");
    }
}
