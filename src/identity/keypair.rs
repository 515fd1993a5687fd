//! Signing keypair.
//!
//! # Security
//! - Private key material is never logged or included in `Debug` output
//! - Serialization happens only through the key file module

use alloy::primitives::{hex, Address, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::{Signature, Signer};
use std::fmt;

use crate::identity::types::{IdentityError, IdentityResult};

/// A secp256k1 keypair used to sign ledger operations.
#[derive(Clone)]
pub struct Keypair {
    signer: PrivateKeySigner,
}

impl Keypair {
    /// Create a keypair from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> IdentityResult<Self> {
        let key_hex = private_key_hex
            .trim()
            .strip_prefix("0x")
            .unwrap_or(private_key_hex.trim());

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| IdentityError::InvalidKey(format!("{}", e)))?;

        Ok(Self { signer })
    }

    /// Generate a random keypair.
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// The address of the public half of this keypair.
    pub fn public_address(&self) -> Address {
        self.signer.address()
    }

    /// Private key as 0x-prefixed hex. Only for persisting to the key file.
    pub(crate) fn private_key_hex(&self) -> String {
        let bytes: B256 = self.signer.to_bytes();
        hex::encode_prefixed(bytes)
    }

    /// Sign a message hash.
    pub async fn sign_hash(&self, hash: B256) -> IdentityResult<Signature> {
        self.signer
            .sign_hash(&hash)
            .await
            .map_err(|e| IdentityError::InvalidKey(format!("Signing failed: {}", e)))
    }

    /// Sign arbitrary message bytes (with Ethereum prefix).
    pub async fn sign_message(&self, message: &[u8]) -> IdentityResult<Signature> {
        self.signer
            .sign_message(message)
            .await
            .map_err(|e| IdentityError::InvalidKey(format!("Message signing failed: {}", e)))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.public_address())
            .finish_non_exhaustive()
    }
}
