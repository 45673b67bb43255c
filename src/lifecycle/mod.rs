//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Controller created → Active
//! Controller::close():
//!     shutdown.rs trigger
//!     → watcher fetch loop exits (in-flight fetch abandoned)
//!     → endpoint consumer exits
//!     → further events ignored (Closed, terminal)
//! ```

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownListener};
