//! Per-service balancer builder.

use std::sync::Arc;

use crate::balancer::controller::Balancer;
use crate::balancer::picker::{PickerBuilder, RoundRobin};
use crate::balancer::routing::RoutingLayer;
use crate::config::BalancerConfig;
use crate::discovery::MembershipProvider;
use crate::resilience::backoff::Backoff;

/// Produces one [`Balancer`] per routing target, all bound to the same
/// service name and membership provider.
#[derive(Debug)]
pub struct BalancerBuilder<P> {
    name: String,
    provider: Arc<P>,
    backoff: Backoff,
}

impl<P> Clone for BalancerBuilder<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            provider: self.provider.clone(),
            backoff: self.backoff,
        }
    }
}

impl<P: MembershipProvider> BalancerBuilder<P> {
    pub fn new(name: impl Into<String>, provider: Arc<P>) -> Self {
        Self {
            name: name.into(),
            provider,
            backoff: Backoff::default(),
        }
    }

    /// Builder for `config.service_name` using the configured retry backoff.
    pub fn from_config(config: &BalancerConfig, provider: Arc<P>) -> Self {
        Self {
            name: config.service_name.clone(),
            provider,
            backoff: Backoff::from_config(&config.watch.retry),
        }
    }

    /// Retry policy for failed watcher fetches. Delays below 1 ms are raised
    /// to 1 ms by [`Backoff`].
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Service name, also the policy name the routing layer registers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a round-robin balancer driving `routing`.
    pub fn build<R: RoutingLayer>(&self, routing: Arc<R>) -> Balancer<P, R> {
        self.build_with_picker(routing, Arc::new(RoundRobin::new()))
    }

    /// Build a balancer with an alternate selection strategy.
    pub fn build_with_picker<R: RoutingLayer>(
        &self,
        routing: Arc<R>,
        strategy: Arc<dyn PickerBuilder<R::Handle>>,
    ) -> Balancer<P, R> {
        tracing::debug!(service = %self.name, "Building balancer");
        Balancer::new(self.name.clone(), self.provider.clone(), routing, strategy, self.backoff)
    }
}
