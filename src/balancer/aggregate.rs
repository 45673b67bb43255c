//! Aggregated health over a registry snapshot.

use crate::balancer::state::{AggregatedState, HealthState};

/// Reduce per-connection states to one signal.
///
/// Any `Ready` wins, then any `Connecting`; everything else (including an
/// empty registry) is `TransientFailure`.
pub fn aggregate<'a, I>(states: I) -> AggregatedState
where
    I: IntoIterator<Item = &'a HealthState>,
{
    let mut connecting = false;
    for state in states {
        match state {
            HealthState::Ready => return AggregatedState::Ready,
            HealthState::Connecting => connecting = true,
            _ => {}
        }
    }

    if connecting {
        AggregatedState::Connecting
    } else {
        AggregatedState::TransientFailure
    }
}
