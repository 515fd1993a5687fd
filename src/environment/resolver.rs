//! Execution environment resolution.
//!
//! # Responsibilities
//! - Build the ordered candidate chain for a deployment mode
//! - Probe candidates that need a live local node, first success wins
//! - Attach the distributed cache when the connection manager reports ready
//! - Emit the operator warnings for each degraded path
//!
//! # Design Decisions
//! - Resolution never fails: the last candidate has no precondition
//! - The probe is injected; production never probes anything

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheHandle;
use crate::config::{ConfigError, NetworkConfig};
use crate::environment::reachability::{ReachabilityProbe, TcpProbe};
use crate::environment::types::{
    DeploymentMode, Endpoint, ExecutionMode, ExecutionTarget, NetworkKind,
};
use crate::observability::metrics;

/// One entry in the fallback chain.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub mode: ExecutionMode,
    pub endpoint: Endpoint,
    /// Host and port that must answer before this candidate is accepted.
    pub requires: Option<(String, u16)>,
}

/// Ordered candidates; `fallback` is used when every preferred one fails.
#[derive(Debug, Clone)]
pub struct CandidateChain {
    pub preferred: Vec<Candidate>,
    pub fallback: Candidate,
}

/// Decides the execution target for this process.
pub struct EnvironmentResolver {
    network: NetworkConfig,
    mainnet: url::Url,
    testnet: url::Url,
    local: url::Url,
    probe: Arc<dyn ReachabilityProbe>,
}

impl EnvironmentResolver {
    /// Create a resolver with an explicit reachability probe.
    pub fn new(network: NetworkConfig, probe: Arc<dyn ReachabilityProbe>) -> Result<Self, ConfigError> {
        let parse = |name: &'static str, raw: &str| {
            url::Url::parse(raw).map_err(|e| ConfigError::Invalid {
                name,
                reason: format!("'{}': {}", raw, e),
            })
        };

        let mainnet = parse("network.mainnet_url", &network.mainnet_url)?;
        let testnet = parse("network.testnet_url", &network.testnet_url)?;
        let local = parse(
            "network.local_host",
            &format!("http://{}:{}", network.local_host, network.local_port),
        )?;

        Ok(Self {
            network,
            mainnet,
            testnet,
            local,
            probe,
        })
    }

    /// Create a resolver that probes over TCP.
    pub fn with_tcp_probe(network: NetworkConfig) -> Result<Self, ConfigError> {
        Self::new(network, Arc::new(TcpProbe))
    }

    /// Candidate chain for a deployment mode.
    pub fn candidates(&self, mode: DeploymentMode) -> CandidateChain {
        match mode {
            DeploymentMode::Production => CandidateChain {
                preferred: Vec::new(),
                fallback: Candidate {
                    mode: ExecutionMode::Production,
                    endpoint: Endpoint {
                        network: NetworkKind::Mainnet,
                        url: self.mainnet.clone(),
                    },
                    requires: None,
                },
            },
            DeploymentMode::Development => CandidateChain {
                preferred: vec![Candidate {
                    mode: ExecutionMode::LocalPreferred,
                    endpoint: Endpoint {
                        network: NetworkKind::Local,
                        url: self.local.clone(),
                    },
                    requires: Some((self.network.local_host.clone(), self.network.local_port)),
                }],
                fallback: Candidate {
                    mode: ExecutionMode::RemoteFallback,
                    endpoint: Endpoint {
                        network: NetworkKind::Testnet,
                        url: self.testnet.clone(),
                    },
                    requires: None,
                },
            },
        }
    }

    /// Resolve the execution target.
    ///
    /// `cache` is the long-lived distributed cache handle, if one connected.
    pub async fn resolve(&self, mode: DeploymentMode, cache: Option<&CacheHandle>) -> ExecutionTarget {
        let cache_ready = cache.is_some_and(CacheHandle::is_ready);
        let chain = self.candidates(mode);
        let selected = self.select(chain).await;

        match selected.mode {
            ExecutionMode::Production => {
                if !cache_ready {
                    tracing::debug!("Distributed cache unavailable, using local persistent cache tier");
                }
            }
            ExecutionMode::LocalPreferred => {
                tracing::warn!(
                    distributed_cache = cache_ready,
                    "Local execution network in use; full search and query functionality \
                     requires the distributed cache"
                );
            }
            ExecutionMode::RemoteFallback => {
                tracing::warn!(
                    endpoint = %selected.endpoint.url,
                    "Falling back to remote non-production network; some operations may behave inconsistently"
                );
            }
        }

        let target = ExecutionTarget::new(selected.mode, selected.endpoint, cache_ready);
        metrics::record_execution_mode(target.mode());

        tracing::info!(
            mode = %target.mode(),
            endpoint = %target.endpoint().url,
            distributed_cache = target.uses_distributed_cache(),
            "Execution target resolved"
        );

        target
    }

    async fn select(&self, chain: CandidateChain) -> Candidate {
        let deadline = Duration::from_millis(self.network.probe_timeout_ms);

        for candidate in chain.preferred {
            let Some((host, port)) = candidate.requires.as_ref() else {
                return candidate;
            };

            match self.probe.probe(host, *port, deadline).await {
                Ok(()) => {
                    tracing::info!(host = %host, port = *port, "Local execution network reachable");
                    return candidate;
                }
                Err(failure) => {
                    tracing::warn!(host = %host, port = *port, "Local execution network not running");
                    tracing::warn!(reason = %failure, "Local execution network probe failed");
                    tracing::warn!(
                        command = %self.network.local_start_command,
                        "Start a local execution network with: {}",
                        self.network.local_start_command
                    );
                }
            }
        }

        chain.fallback
    }
}

impl std::fmt::Debug for EnvironmentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentResolver")
            .field("mainnet", &self.mainnet.as_str())
            .field("testnet", &self.testnet.as_str())
            .field("local", &self.local.as_str())
            .field("probe_timeout_ms", &self.network.probe_timeout_ms)
            .finish()
    }
}
