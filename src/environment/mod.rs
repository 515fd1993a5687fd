//! Execution environment subsystem.
//!
//! # Data Flow
//! ```text
//! DeploymentMode + NetworkConfig
//!     → resolver.rs (candidate chain)
//!         production:  [mainnet]
//!         development: [local (probe 127.0.0.1:1984)] → testnet
//!     → reachability.rs (bounded TCP probe, injectable)
//!     → ExecutionTarget (immutable, carries KeyAuthority)
//! ```
//!
//! # Design Decisions
//! - Environment selection never fails startup
//! - The distributed cache is attached only when already ready
//! - The deploy plugin is attached in every mode

pub mod reachability;
pub mod resolver;
pub mod types;

pub use reachability::{ProbeFailure, ReachabilityProbe, TcpProbe};
pub use resolver::EnvironmentResolver;
pub use types::{
    CacheStrategy, CacheTier, DeploymentMode, Endpoint, ExecutionMode, ExecutionTarget,
    NetworkKind, Plugin,
};
