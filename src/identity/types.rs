//! Identity types and error definitions.

use alloy::primitives::Address;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::identity::keypair::Keypair;

/// Errors that can occur while loading or provisioning the signing identity.
///
/// Every variant is fatal for the bootstrap.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Key file missing or unreadable.
    #[error("Failed to read key file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key file content cannot be interpreted as a keypair.
    #[error("Malformed key file {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    /// Derived address differs from the configured one.
    #[error(
        "Identity mismatch for key file {}: expected address {expected}, derived address {derived}",
        .path.display()
    )]
    Mismatch {
        path: PathBuf,
        expected: Address,
        derived: Address,
    },

    /// Invalid private key material.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// The execution environment could not produce a new keypair.
    #[error("Keypair generation failed: {0}")]
    Generation(String),

    /// A generated keypair could not be written back.
    #[error("Failed to persist key file {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Key operations provided by the resolved execution environment.
///
/// Address derivation and key generation are owned by the environment the
/// identity will sign for, so the loader receives them as a capability.
pub trait KeyAuthority {
    /// Derive the on-ledger address of a keypair.
    fn derive_address(&self, keypair: &Keypair) -> Address;

    /// Produce a fresh keypair.
    fn generate_keypair(&self) -> IdentityResult<Keypair>;
}

/// Where the active identity came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Production key file, validated against the expected address.
    Verified(PathBuf),
    /// Existing development key file.
    Persisted(PathBuf),
    /// Freshly generated and written to the development key file.
    Generated(PathBuf),
}

impl IdentitySource {
    /// Path of the backing key file.
    pub fn path(&self) -> &Path {
        match self {
            Self::Verified(p) | Self::Persisted(p) | Self::Generated(p) => p,
        }
    }
}

/// The process signing identity. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Identity {
    keypair: Keypair,
    address: Address,
    source: IdentitySource,
}

impl Identity {
    pub(crate) fn new(keypair: Keypair, address: Address, source: IdentitySource) -> Self {
        Self {
            keypair,
            address,
            source,
        }
    }

    /// The keypair used to sign operations.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// The on-ledger address derived at load time.
    pub fn address(&self) -> Address {
        self.address
    }

    /// How this identity was obtained.
    pub fn source(&self) -> &IdentitySource {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_reports_both_addresses() {
        let err = IdentityError::Mismatch {
            path: PathBuf::from("/secrets/key.json"),
            expected: Address::ZERO,
            derived: Address::repeat_byte(0x11),
        };
        let msg = err.to_string();
        assert!(msg.contains("/secrets/key.json"));
        assert!(msg.contains(&Address::ZERO.to_string()));
        assert!(msg.contains(&Address::repeat_byte(0x11).to_string()));
    }

    #[test]
    fn test_source_path() {
        let source = IdentitySource::Generated(PathBuf::from(".ledger/identity.json"));
        assert_eq!(source.path(), Path::new(".ledger/identity.json"));
    }
}
