//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment variables overlaid (APP_ENV, REDIS_URL, ...)
//!     → validation.rs (semantic checks)
//!     → BootstrapConfig (validated, immutable)
//!     → consumed once by lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the bootstrap runs exactly once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::BootstrapConfig;
pub use schema::CacheConfig;
pub use schema::IdentityConfig;
pub use schema::NetworkConfig;
