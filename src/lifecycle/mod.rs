//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → cache connect → resolve target → load identity
//!     → Connectivity (immutable, shared)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown of the diagnostic server
//! ```
//!
//! # Design Decisions
//! - Ordered startup: cache first, then environment, then identity
//! - No teardown beyond process exit; the cache heartbeat stops with its handle

pub mod signals;
pub mod startup;

pub use startup::{bootstrap, Bootstrap, Connectivity};
