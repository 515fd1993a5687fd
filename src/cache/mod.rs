//! Distributed cache subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     REDIS_URL?
//!     → connection.rs (one managed connection, PING, heartbeat)
//!     → Option<CacheHandle> (None = operate without the distributed tier)
//!
//! Diagnostics:
//!     GET /health/cache
//!     → probe.rs (30 s memo, separate short-lived connection, 2 s deadline)
//!     → HealthSnapshot
//!
//! State materialization:
//!     tiered.rs: distributed → local persistent → recompute
//! ```
//!
//! # Design Decisions
//! - Cache absence is a valid state, never an error
//! - Health probes never touch the long-lived connection or its state machine
//! - transport.rs isolates Redis so tests can count or forbid I/O

pub mod connection;
pub mod probe;
pub mod tiered;
pub mod transport;

pub use connection::{
    CacheConnectionManager, CacheConnectionState, CacheHandle, ConnectionMonitor,
    ConnectionNotifier, ConnectionStatus, LogGate,
};
pub use probe::{HealthProbeCache, HealthSnapshot, HealthStatus};
pub use tiered::{LocalStateStore, Materialized, TieredStateCache};
pub use transport::{CacheError, CacheSession, CacheTransport, ConnectOptions, RedisTransport};
