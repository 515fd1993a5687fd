//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bootstrap
//! layer. All types derive Serde traits for deserialization from config files;
//! environment variables are overlaid afterwards by the loader.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the bootstrap layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Deployment mode selection.
    pub deployment: DeploymentConfig,

    /// Execution network endpoints and the local reachability probe.
    pub network: NetworkConfig,

    /// Distributed cache connection settings.
    pub cache: CacheConfig,

    /// Signing identity sources.
    pub identity: IdentityConfig,

    /// Local persistent state-cache tier.
    pub state_cache: StateCacheConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Diagnostic HTTP surface.
    pub admin: AdminConfig,
}

/// Deployment mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Raw mode name. Only `production` selects strict behaviour.
    pub mode: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            mode: "development".to_string(),
        }
    }
}

/// Execution network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Canonical production gateway.
    pub mainnet_url: String,

    /// Remote non-production gateway used when no local node answers.
    pub testnet_url: String,

    /// Host of the local execution network.
    pub local_host: String,

    /// Port of the local execution network (development only).
    pub local_port: u16,

    /// Reachability probe timeout in milliseconds.
    pub probe_timeout_ms: u64,

    /// Command printed when the local node is absent.
    pub local_start_command: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mainnet_url: "https://arweave.net".to_string(),
            testnet_url: "https://testnet.redstone.tools".to_string(),
            local_host: "127.0.0.1".to_string(),
            local_port: 1984,
            probe_timeout_ms: 1000,
            local_start_command: "npx arlocal".to_string(),
        }
    }
}

/// Distributed cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache address (e.g., "redis://127.0.0.1:6379"). `None` disables the tier.
    pub url: Option<String>,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Per-command response timeout in seconds.
    pub command_timeout_secs: u64,

    /// Reconnect attempts per failed command.
    pub max_retries: usize,

    /// Interval between background liveness pings in seconds.
    pub heartbeat_interval_secs: u64,

    /// Health probe deadline in milliseconds.
    pub probe_timeout_ms: u64,

    /// Lifetime of a memoized health snapshot in seconds.
    pub health_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            connect_timeout_secs: 10,
            command_timeout_secs: 5,
            max_retries: 3,
            heartbeat_interval_secs: 15,
            probe_timeout_ms: 2000,
            health_ttl_secs: 30,
        }
    }
}

/// Signing identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Production key file path. Required in production.
    pub keyfile_path: Option<PathBuf>,

    /// Production expected public address. Required in production.
    pub expected_address: Option<String>,

    /// Development key file, generated on first start.
    pub dev_keyfile_path: PathBuf,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            keyfile_path: None,
            expected_address: None,
            dev_keyfile_path: PathBuf::from(".ledger/identity.json"),
        }
    }
}

/// Local persistent state-cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StateCacheConfig {
    /// JSON file backing the local tier.
    pub path: PathBuf,

    /// Key prefix used in the distributed tier.
    pub key_prefix: String,
}

impl Default for StateCacheConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".ledger/state-cache.json"),
            key_prefix: "ledger:state:".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Diagnostic HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the diagnostic routes.
    pub enabled: bool,

    /// Bind address for the diagnostic routes.
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.deployment.mode, "development");
        assert_eq!(config.network.local_port, 1984);
        assert_eq!(config.network.probe_timeout_ms, 1000);
        assert!(config.cache.url.is_none());
        assert_eq!(config.cache.connect_timeout_secs, 10);
        assert_eq!(config.cache.command_timeout_secs, 5);
        assert_eq!(config.cache.health_ttl_secs, 30);
    }

    #[test]
    fn test_partial_toml() {
        let config: BootstrapConfig = toml::from_str(
            r#"
            [cache]
            url = "redis://cache:6379"

            [network]
            local_port = 2000
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.cache.probe_timeout_ms, 2000);
        assert_eq!(config.network.local_port, 2000);
        assert_eq!(config.network.mainnet_url, "https://arweave.net");
    }
}
