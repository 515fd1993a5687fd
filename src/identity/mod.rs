//! Signing identity subsystem.
//!
//! # Data Flow
//! ```text
//! Production:
//!     IDENTITY_KEYFILE + IDENTITY_ADDRESS (both required)
//!     → keyfile.rs (read & parse)
//!     → KeyAuthority::derive_address (execution target)
//!     → byte-for-byte compare, mismatch is fatal
//!
//! Development:
//!     .ledger/identity.json present → reuse
//!     absent → KeyAuthority::generate_keypair → keyfile.rs (persist)
//! ```
//!
//! # Security Constraints
//! - Private keys never appear in logs or `Debug` output
//! - Production identities are never regenerated
//! - Key files are written with owner-only permissions

pub mod keyfile;
pub mod keypair;
pub mod loader;
pub mod types;

pub use keypair::Keypair;
pub use loader::load_identity;
pub use types::{Identity, IdentityError, IdentityResult, IdentitySource, KeyAuthority};
