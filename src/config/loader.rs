//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::BootstrapConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Deployment mode (`production` or anything else).
pub const ENV_DEPLOYMENT_MODE: &str = "APP_ENV";
/// Distributed cache address.
pub const ENV_CACHE_URL: &str = "REDIS_URL";
/// Production key file path.
pub const ENV_IDENTITY_KEYFILE: &str = "IDENTITY_KEYFILE";
/// Production expected public address.
pub const ENV_IDENTITY_ADDRESS: &str = "IDENTITY_ADDRESS";
/// Local execution-network probe port.
pub const ENV_LOCAL_NETWORK_PORT: &str = "LOCAL_NETWORK_PORT";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// A variable required by the selected deployment mode is absent.
    #[error("Required configuration {0} is not set")]
    Missing(&'static str),

    /// A variable is present but cannot be interpreted.
    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BootstrapConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: BootstrapConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the effective configuration: optional file, then process environment.
pub fn load_effective(path: Option<&Path>) -> Result<BootstrapConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => BootstrapConfig::default(),
    };

    apply_env(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-style variables onto a configuration.
///
/// `lookup` abstracts the environment so callers can supply a fixed map.
/// Empty values are treated as absent.
pub fn apply_env<F>(config: &mut BootstrapConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(mode) = get(ENV_DEPLOYMENT_MODE) {
        config.deployment.mode = mode;
    }
    if let Some(url) = get(ENV_CACHE_URL) {
        config.cache.url = Some(url);
    }
    if let Some(path) = get(ENV_IDENTITY_KEYFILE) {
        config.identity.keyfile_path = Some(PathBuf::from(path));
    }
    if let Some(address) = get(ENV_IDENTITY_ADDRESS) {
        config.identity.expected_address = Some(address);
    }
    if let Some(port) = get(ENV_LOCAL_NETWORK_PORT) {
        config.network.local_port = port.trim().parse().map_err(|e| ConfigError::Invalid {
            name: ENV_LOCAL_NETWORK_PORT,
            reason: format!("{}", e),
        })?;
    }

    Ok(())
}
