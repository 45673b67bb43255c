//! Membership watcher.
//!
//! # Responsibilities
//! - Long-poll the provider for a service's endpoints
//! - Forward every non-empty snapshot downstream
//! - Retry failed fetches forever with backoff, same cursor
//! - Stop promptly on shutdown
//!
//! # Design Decisions
//! - Fetch, backoff sleep and downstream send all race the shutdown signal,
//!   so no step can block after close; an in-flight fetch is dropped
//! - An empty snapshot is only a warning; its cursor is still adopted so the
//!   next fetch long-polls instead of spinning

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::discovery::{Endpoint, MembershipProvider};
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;

/// Background loop feeding endpoint lists to the controller.
#[derive(Debug)]
pub struct Watcher<P> {
    service: String,
    provider: Arc<P>,
    backoff: Backoff,
}

impl<P: MembershipProvider> Watcher<P> {
    pub fn new(service: impl Into<String>, provider: Arc<P>, backoff: Backoff) -> Self {
        Self {
            service: service.into(),
            provider,
            backoff,
        }
    }

    /// Run until shutdown fires or the receiving side goes away.
    pub async fn run(self, tx: mpsc::Sender<Vec<Endpoint>>, mut shutdown: ShutdownListener) {
        let mut cursor = 0u64;
        let mut attempt = 0u32;

        tracing::info!(service = %self.service, "Membership watcher starting");

        loop {
            let fetched = tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                res = self.provider.endpoints(&self.service, cursor) => res,
            };

            let snapshot = match fetched {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    metrics::record_watch_error(&self.service);
                    let delay = self.backoff.delay(attempt);
                    tracing::error!(
                        service = %self.service,
                        cursor,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Membership fetch failed, sleeping before retry"
                    );
                    tokio::select! {
                        biased;
                        _ = shutdown.recv() => break,
                        _ = tokio::time::sleep(delay) => continue,
                    }
                }
            };
            attempt = 0;
            cursor = snapshot.index;

            if snapshot.endpoints.is_empty() {
                tracing::warn!(service = %self.service, cursor, "Provider has no endpoints. Waiting...");
                continue;
            }

            metrics::record_snapshot(&self.service, snapshot.endpoints.len());
            tracing::debug!(
                service = %self.service,
                cursor,
                endpoints = snapshot.endpoints.len(),
                "Membership snapshot received"
            );

            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                sent = tx.send(snapshot.endpoints) => {
                    if sent.is_err() {
                        tracing::debug!(service = %self.service, "Endpoint receiver dropped");
                        break;
                    }
                }
            }
        }

        tracing::info!(service = %self.service, "Membership watcher stopped");
    }
}
