//! JSON key file persistence.
//!
//! Format: `{"private_key": "0x…", "address": "0x…"}`. The address is
//! informational; when present it must match the private key.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::identity::keypair::Keypair;
use crate::identity::types::{IdentityError, IdentityResult};

#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    private_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<Address>,
}

/// Read a keypair from a key file.
pub fn read_key_file(path: &Path) -> IdentityResult<Keypair> {
    let content = fs::read_to_string(path).map_err(|source| IdentityError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let file: KeyFile = serde_json::from_str(&content).map_err(|e| IdentityError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let keypair = Keypair::from_private_key(&file.private_key).map_err(|e| {
        IdentityError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    if let Some(recorded) = file.address {
        if recorded != keypair.public_address() {
            return Err(IdentityError::Malformed {
                path: path.to_path_buf(),
                reason: format!(
                    "recorded address {} does not belong to the private key",
                    recorded
                ),
            });
        }
    }

    Ok(keypair)
}

/// Write a keypair to a key file, creating parent directories.
///
/// The file is written next to its destination and renamed into place so a
/// crash never leaves a truncated key file behind.
pub fn write_key_file(path: &Path, keypair: &Keypair, address: Address) -> IdentityResult<()> {
    let persist_err = |source| IdentityError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let file = KeyFile {
        private_key: keypair.private_key_hex(),
        address: Some(address),
    };
    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| persist_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let tmp = staging_path(path);
    fs::write(&tmp, json).map_err(persist_err)?;
    restrict_permissions(&tmp).map_err(persist_err)?;
    fs::rename(&tmp, path).map_err(persist_err)?;

    Ok(())
}

/// Move an unreadable key file aside so a new one can be provisioned.
pub fn quarantine_key_file(path: &Path) -> std::io::Result<PathBuf> {
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".corrupt-{}", stamp));
    let target = PathBuf::from(name);
    fs::rename(path, &target)?;
    Ok(target)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
