//! Identity resolution.
//!
//! # Responsibilities
//! - Production: load the configured key file and verify it against the
//!   expected address (fail closed)
//! - Development: reuse the local key file or provision a new one (fail open)

use alloy::primitives::Address;
use std::path::Path;
use std::str::FromStr;

use crate::config::loader::{ConfigError, ENV_IDENTITY_ADDRESS, ENV_IDENTITY_KEYFILE};
use crate::config::IdentityConfig;
use crate::environment::DeploymentMode;
use crate::error::BootstrapError;
use crate::identity::keyfile::{quarantine_key_file, read_key_file, write_key_file};
use crate::identity::types::{Identity, IdentityError, IdentitySource, KeyAuthority};

/// Load the signing identity for the given deployment mode.
///
/// `authority` is the already-resolved execution target; its derivation
/// function is the one the ledger uses, so validation happens strictly after
/// environment resolution.
pub fn load_identity(
    mode: DeploymentMode,
    config: &IdentityConfig,
    authority: &dyn KeyAuthority,
) -> Result<Identity, BootstrapError> {
    match mode {
        DeploymentMode::Production => load_verified(config, authority),
        DeploymentMode::Development => load_or_provision(&config.dev_keyfile_path, authority),
    }
}

fn load_verified(
    config: &IdentityConfig,
    authority: &dyn KeyAuthority,
) -> Result<Identity, BootstrapError> {
    let path = config
        .keyfile_path
        .as_deref()
        .ok_or(ConfigError::Missing(ENV_IDENTITY_KEYFILE))?;
    let expected_raw = config
        .expected_address
        .as_deref()
        .ok_or(ConfigError::Missing(ENV_IDENTITY_ADDRESS))?;
    let expected = Address::from_str(expected_raw.trim()).map_err(|e| ConfigError::Invalid {
        name: ENV_IDENTITY_ADDRESS,
        reason: e.to_string(),
    })?;

    let keypair = read_key_file(path)?;
    let derived = authority.derive_address(&keypair);

    if derived != expected {
        tracing::error!(
            path = %path.display(),
            expected = %expected,
            derived = %derived,
            "Production identity does not match expected address"
        );
        return Err(IdentityError::Mismatch {
            path: path.to_path_buf(),
            expected,
            derived,
        }
        .into());
    }

    tracing::info!(address = %derived, path = %path.display(), "Production identity verified");
    Ok(Identity::new(
        keypair,
        derived,
        IdentitySource::Verified(path.to_path_buf()),
    ))
}

fn load_or_provision(
    path: &Path,
    authority: &dyn KeyAuthority,
) -> Result<Identity, BootstrapError> {
    if path.exists() {
        match read_key_file(path) {
            Ok(keypair) => {
                let address = authority.derive_address(&keypair);
                tracing::info!(address = %address, path = %path.display(), "Loaded development identity");
                return Ok(Identity::new(
                    keypair,
                    address,
                    IdentitySource::Persisted(path.to_path_buf()),
                ));
            }
            Err(e) => {
                let moved = quarantine_key_file(path).map_err(|source| IdentityError::Persist {
                    path: path.to_path_buf(),
                    source,
                })?;
                tracing::warn!(
                    error = %e,
                    moved_to = %moved.display(),
                    "Development key file unusable, provisioning a new identity"
                );
            }
        }
    }

    let keypair = authority.generate_keypair()?;
    let address = authority.derive_address(&keypair);
    write_key_file(path, &keypair, address)?;

    tracing::info!(address = %address, path = %path.display(), "Generated development identity");
    Ok(Identity::new(
        keypair,
        address,
        IdentitySource::Generated(path.to_path_buf()),
    ))
}
