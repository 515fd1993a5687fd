//! Ledger connectivity bootstrap.
//!
//! Gives a backend process an identity-authenticated connection to a
//! ledger-backed execution environment, backed by a tiered cache hierarchy,
//! without blocking indefinitely or crashing on transient unavailability.

pub mod admin;
pub mod cache;
pub mod config;
pub mod environment;
pub mod error;
pub mod identity;
pub mod lifecycle;
pub mod observability;

pub use config::schema::BootstrapConfig;
pub use error::BootstrapError;
pub use lifecycle::{bootstrap, Bootstrap, Connectivity};
