//! Execution target types.

use alloy::primitives::Address;
use serde::Serialize;
use std::fmt;

use crate::identity::{IdentityResult, KeyAuthority, Keypair};

/// Deployment context of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    /// Strict identity validation, canonical network.
    Production,
    /// Any non-production value: local-first with remote fallback.
    Development,
}

impl DeploymentMode {
    /// Interpret a raw mode name. Only `production` selects strict mode.
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Execution mode selected by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Remote canonical network.
    Production,
    /// Local execution network answered the reachability probe.
    LocalPreferred,
    /// Local network absent; remote non-production network in use.
    RemoteFallback,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Production => "production",
            Self::LocalPreferred => "local_preferred",
            Self::RemoteFallback => "remote_fallback",
        };
        f.write_str(s)
    }
}

/// Network behind an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkKind {
    Mainnet,
    Testnet,
    Local,
}

/// Gateway the execution layer talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub network: NetworkKind,
    pub url: url::Url,
}

/// One tier of the state-materialization hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTier {
    /// Shared network cache.
    Distributed,
    /// On-disk cache of this process.
    LocalPersistent,
    /// Re-evaluate from ledger source.
    Recompute,
}

/// Ordered lookup tiers, fastest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStrategy {
    tiers: Vec<CacheTier>,
}

impl CacheStrategy {
    pub fn new(distributed: bool) -> Self {
        let mut tiers = Vec::with_capacity(3);
        if distributed {
            tiers.push(CacheTier::Distributed);
        }
        tiers.push(CacheTier::LocalPersistent);
        tiers.push(CacheTier::Recompute);
        Self { tiers }
    }

    pub fn tiers(&self) -> &[CacheTier] {
        &self.tiers
    }
}

/// Capabilities attached to the execution target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Plugin {
    /// Required for state-mutating (deploy) operations.
    Deploy,
}

/// Resolved execution environment. Built once at startup, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionTarget {
    mode: ExecutionMode,
    endpoint: Endpoint,
    uses_distributed_cache: bool,
    cache_strategy: CacheStrategy,
    plugins: Vec<Plugin>,
}

impl ExecutionTarget {
    pub(crate) fn new(mode: ExecutionMode, endpoint: Endpoint, uses_distributed_cache: bool) -> Self {
        Self {
            mode,
            endpoint,
            uses_distributed_cache,
            cache_strategy: CacheStrategy::new(uses_distributed_cache),
            plugins: vec![Plugin::Deploy],
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn uses_distributed_cache(&self) -> bool {
        self.uses_distributed_cache
    }

    pub fn cache_strategy(&self) -> &CacheStrategy {
        &self.cache_strategy
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn has_plugin(&self, plugin: Plugin) -> bool {
        self.plugins.contains(&plugin)
    }
}

impl KeyAuthority for ExecutionTarget {
    fn derive_address(&self, keypair: &Keypair) -> Address {
        keypair.public_address()
    }

    fn generate_keypair(&self) -> IdentityResult<Keypair> {
        Ok(Keypair::random())
    }
}
