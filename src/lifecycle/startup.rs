//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Connect the distributed cache (absence is fine)
//! - Resolve the execution target
//! - Load or provision the signing identity
//! - Assemble the immutable [`Connectivity`] handle
//!
//! # Design Decisions
//! - Fail fast: configuration and identity errors abort startup
//! - Steps run in order, not concurrently; each I/O step has its own deadline
//! - Identity is resolved strictly after the execution target

use std::sync::Arc;

use crate::cache::{
    CacheConnectionManager, CacheHandle, CacheTransport, HealthProbeCache, HealthSnapshot,
    LocalStateStore, RedisTransport, TieredStateCache,
};
use crate::config::validation::validate_config;
use crate::config::{BootstrapConfig, ConfigError};
use crate::environment::{
    DeploymentMode, EnvironmentResolver, ExecutionTarget, ReachabilityProbe, TcpProbe,
};
use crate::error::BootstrapError;
use crate::identity::{load_identity, Identity};

/// Fully configured connectivity, shared read-only for the process lifetime.
#[derive(Clone)]
pub struct Connectivity {
    mode: DeploymentMode,
    target: Arc<ExecutionTarget>,
    identity: Arc<Identity>,
    cache: Option<CacheHandle>,
    health: Arc<HealthProbeCache>,
    state_cache: TieredStateCache,
}

impl Connectivity {
    pub fn deployment_mode(&self) -> DeploymentMode {
        self.mode
    }

    pub fn execution_target(&self) -> &ExecutionTarget {
        &self.target
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The long-lived distributed cache handle, if one connected.
    pub fn cache_handle(&self) -> Option<&CacheHandle> {
        self.cache.as_ref()
    }

    /// Memoized distributed-cache health. Safe to call from a health endpoint.
    pub async fn check_connectivity(&self) -> HealthSnapshot {
        self.health.check_connectivity().await
    }

    /// Tiered state cache built from the target's cache strategy.
    pub fn state_cache(&self) -> &TieredStateCache {
        &self.state_cache
    }
}

impl std::fmt::Debug for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connectivity")
            .field("mode", &self.mode)
            .field("target", &self.target)
            .field("address", &self.identity.address())
            .field("cache", &self.cache)
            .finish()
    }
}

/// Bootstrap sequence with injectable I/O seams.
pub struct Bootstrap {
    config: BootstrapConfig,
    transport: Arc<dyn CacheTransport>,
    probe: Arc<dyn ReachabilityProbe>,
}

impl Bootstrap {
    /// Bootstrap over Redis and TCP.
    pub fn new(config: BootstrapConfig) -> Self {
        Self {
            config,
            transport: Arc::new(RedisTransport),
            probe: Arc::new(TcpProbe),
        }
    }

    /// Replace the cache transport used by both the manager and the probe.
    pub fn with_transport(mut self, transport: Arc<dyn CacheTransport>) -> Self {
        self.transport = transport;
        self
    }

    /// Replace the local network reachability probe.
    pub fn with_probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Run the bootstrap sequence once.
    pub async fn run(self) -> Result<Connectivity, BootstrapError> {
        validate_config(&self.config).map_err(ConfigError::Validation)?;

        let mode = DeploymentMode::from_name(&self.config.deployment.mode);
        tracing::info!(mode = ?mode, "Bootstrapping ledger connectivity");

        // 1. Distributed cache (never fatal)
        let cache = CacheConnectionManager::new(self.config.cache.clone(), self.transport.clone())
            .connect()
            .await;

        // 2. Execution target (never fatal)
        let resolver = EnvironmentResolver::new(self.config.network.clone(), self.probe.clone())?;
        let target = resolver.resolve(mode, cache.as_ref()).await;

        // 3. Identity (fatal on failure)
        let identity = load_identity(mode, &self.config.identity, &target)?;

        let state_cache = TieredStateCache::new(
            target.cache_strategy(),
            cache.clone(),
            open_local_store(&self.config),
            self.config.state_cache.key_prefix.clone(),
        );
        let health = Arc::new(HealthProbeCache::new(&self.config.cache, self.transport.clone()));

        tracing::info!(
            mode = %target.mode(),
            endpoint = %target.endpoint().url,
            address = %identity.address(),
            distributed_cache = target.uses_distributed_cache(),
            "Bootstrap complete"
        );

        Ok(Connectivity {
            mode,
            target: Arc::new(target),
            identity: Arc::new(identity),
            cache,
            health,
            state_cache,
        })
    }
}

/// Run the default bootstrap (Redis + TCP probe).
pub async fn bootstrap(config: BootstrapConfig) -> Result<Connectivity, BootstrapError> {
    Bootstrap::new(config).run().await
}

fn open_local_store(config: &BootstrapConfig) -> LocalStateStore {
    let path = &config.state_cache.path;
    LocalStateStore::load_from_file(path).unwrap_or_else(|e| {
        tracing::warn!(
            error = %e,
            path = %path.display(),
            "Local state cache unreadable, starting empty"
        );
        LocalStateStore::new(Some(path.clone()))
    })
}
