//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Provider fetch fails:
//!     → watcher logs the error
//!     → backoff.rs (delay for this attempt)
//!     → retry with the same cursor
//! ```
//!
//! # Design Decisions
//! - Fetch errors are never fatal; the watcher retries forever
//! - Fixed delay by default, exponential with jitter when configured

pub mod backoff;
