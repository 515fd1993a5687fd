//! Memoized distributed-cache health probe.
//!
//! # Responsibilities
//! - Answer diagnostic connectivity checks cheaply under frequent polling
//! - Use a separate short-lived connection per probe, never the long-lived one
//! - Release the probe connection on every exit path
//!
//! # Design Decisions
//! - One process-wide snapshot slot, replaced wholesale on recompute
//! - Concurrent recomputations are allowed; the first one published inside a
//!   window wins and later duplicates return it

use arc_swap::ArcSwapOption;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{timeout, Instant};

use crate::cache::transport::{CacheError, CacheTransport, RedisTransport};
use crate::config::CacheConfig;
use crate::observability::metrics;

/// Outcome classification of a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    NotConfigured,
    Connected,
    Unreachable,
    TimedOut,
}

impl HealthStatus {
    fn label(self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Connected => "connected",
            Self::Unreachable => "unreachable",
            Self::TimedOut => "timed_out",
        }
    }
}

/// Point-in-time view of distributed cache reachability.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub configured: bool,
    pub connected: bool,
    pub status: HealthStatus,
    pub details: String,
    /// Capture time, milliseconds since the Unix epoch.
    pub captured_at: u64,
    #[serde(skip)]
    observed: Instant,
}

impl HealthSnapshot {
    fn new(configured: bool, status: HealthStatus, details: impl Into<String>) -> Self {
        Self {
            configured,
            connected: status == HealthStatus::Connected,
            status,
            details: details.into(),
            captured_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            observed: Instant::now(),
        }
    }

    /// Age of the snapshot.
    pub fn age(&self) -> Duration {
        self.observed.elapsed()
    }
}

/// TTL-memoized connectivity check.
pub struct HealthProbeCache {
    url: Option<String>,
    transport: Arc<dyn CacheTransport>,
    ttl: Duration,
    deadline: Duration,
    slot: ArcSwapOption<HealthSnapshot>,
}

impl HealthProbeCache {
    pub fn new(config: &CacheConfig, transport: Arc<dyn CacheTransport>) -> Self {
        Self {
            url: config.url.clone(),
            transport,
            ttl: Duration::from_secs(config.health_ttl_secs),
            deadline: Duration::from_millis(config.probe_timeout_ms),
            slot: ArcSwapOption::empty(),
        }
    }

    pub fn with_redis(config: &CacheConfig) -> Self {
        Self::new(config, Arc::new(RedisTransport))
    }

    /// Current connectivity snapshot, recomputed at most once per TTL window.
    pub async fn check_connectivity(&self) -> HealthSnapshot {
        if let Some(current) = self.slot.load_full() {
            if current.age() < self.ttl {
                return current.as_ref().clone();
            }
        }

        let started = Instant::now();
        let fresh = Arc::new(self.probe().await);

        let previous = self.slot.rcu(|current| match current {
            Some(existing) if existing.observed >= started => Some(Arc::clone(existing)),
            _ => Some(Arc::clone(&fresh)),
        });

        let winner = match previous {
            Some(existing) if existing.observed >= started => existing,
            _ => fresh,
        };
        winner.as_ref().clone()
    }

    async fn probe(&self) -> HealthSnapshot {
        let Some(url) = self.url.as_deref() else {
            return HealthSnapshot::new(false, HealthStatus::NotConfigured, "distributed cache not configured");
        };

        // The session lives inside this future, so it is dropped on success,
        // on error and when the deadline cancels the future.
        let attempt = async {
            let session = self.transport.connect_probe(url, self.deadline).await?;
            session.ping().await
        };

        let snapshot = match timeout(self.deadline, attempt).await {
            Ok(Ok(())) => HealthSnapshot::new(true, HealthStatus::Connected, "PING succeeded"),
            Ok(Err(e)) => HealthSnapshot::new(true, HealthStatus::Unreachable, e.to_string()),
            Err(_) => HealthSnapshot::new(
                true,
                HealthStatus::TimedOut,
                CacheError::timeout(self.deadline).to_string(),
            ),
        };

        metrics::record_health_probe(snapshot.status.label());
        if !snapshot.connected {
            tracing::debug!(status = ?snapshot.status, details = %snapshot.details, "Cache health probe failed");
        }
        snapshot
    }
}

impl std::fmt::Debug for HealthProbeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthProbeCache")
            .field("configured", &self.url.is_some())
            .field("ttl", &self.ttl)
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::transport::{CacheSession, ConnectOptions};
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Behavior {
        Pong,
        Refuse,
        Hang,
    }

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
    }

    struct ProbeSession {
        behavior: Behavior,
        counters: Arc<Counters>,
    }

    impl Drop for ProbeSession {
        fn drop(&mut self) {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CacheSession for ProbeSession {
        fn ping(&self) -> BoxFuture<'_, Result<(), CacheError>> {
            let behavior = self.behavior;
            Box::pin(async move {
                match behavior {
                    Behavior::Pong => Ok(()),
                    Behavior::Refuse => Err(CacheError::Command("NOAUTH".into())),
                    Behavior::Hang => std::future::pending::<Result<(), CacheError>>().await,
                }
            })
        }

        fn get<'a>(&'a self, _key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
            Box::pin(async { Ok(None) })
        }

        fn set<'a>(&'a self, _key: &'a str, _value: &'a str) -> BoxFuture<'a, Result<(), CacheError>> {
            Box::pin(async { Ok(()) })
        }
    }

    struct ProbeTransport {
        behavior: Behavior,
        counters: Arc<Counters>,
    }

    impl ProbeTransport {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                counters: Arc::new(Counters::default()),
            })
        }
    }

    impl CacheTransport for ProbeTransport {
        fn connect_managed(
            &self,
            _url: &str,
            _options: &ConnectOptions,
        ) -> BoxFuture<'_, Result<Arc<dyn CacheSession>, CacheError>> {
            panic!("health probe must not open managed connections");
        }

        fn connect_probe(
            &self,
            _url: &str,
            _deadline: Duration,
        ) -> BoxFuture<'_, Result<Box<dyn CacheSession>, CacheError>> {
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            let session = ProbeSession {
                behavior: self.behavior,
                counters: self.counters.clone(),
            };
            Box::pin(async move { Ok(Box::new(session) as Box<dyn CacheSession>) })
        }
    }

    struct ForbiddenTransport;

    impl CacheTransport for ForbiddenTransport {
        fn connect_managed(
            &self,
            _url: &str,
            _options: &ConnectOptions,
        ) -> BoxFuture<'_, Result<Arc<dyn CacheSession>, CacheError>> {
            panic!("no network I/O expected");
        }

        fn connect_probe(
            &self,
            _url: &str,
            _deadline: Duration,
        ) -> BoxFuture<'_, Result<Box<dyn CacheSession>, CacheError>> {
            panic!("no network I/O expected");
        }
    }

    fn configured() -> CacheConfig {
        CacheConfig {
            url: Some("redis://127.0.0.1:6379".into()),
            ..CacheConfig::default()
        }
    }

    #[tokio::test]
    async fn test_not_configured_performs_no_io() {
        let cache = HealthProbeCache::new(&CacheConfig::default(), Arc::new(ForbiddenTransport));
        let snapshot = cache.check_connectivity().await;

        assert!(!snapshot.configured);
        assert!(!snapshot.connected);
        assert_eq!(snapshot.status, HealthStatus::NotConfigured);
    }

    #[tokio::test(start_paused = true)]
    async fn test_memoized_within_ttl() {
        let transport = ProbeTransport::new(Behavior::Pong);
        let cache = HealthProbeCache::new(&configured(), transport.clone());

        let first = cache.check_connectivity().await;
        assert!(first.configured && first.connected);

        tokio::time::advance(Duration::from_secs(10)).await;
        let second = cache.check_connectivity().await;
        assert_eq!(second.captured_at, first.captured_at);
        assert_eq!(transport.counters.opened.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(21)).await;
        cache.check_connectivity().await;
        assert_eq!(transport.counters.opened.load(Ordering::SeqCst), 2);
        assert_eq!(transport.counters.closed.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_reports_disconnected() {
        let transport = ProbeTransport::new(Behavior::Refuse);
        let cache = HealthProbeCache::new(&configured(), transport.clone());

        let snapshot = cache.check_connectivity().await;
        assert!(snapshot.configured);
        assert!(!snapshot.connected);
        assert_eq!(snapshot.status, HealthStatus::Unreachable);
        assert!(snapshot.details.contains("NOAUTH"));
        assert_eq!(transport.counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_releases_connection() {
        let transport = ProbeTransport::new(Behavior::Hang);
        let cache = HealthProbeCache::new(&configured(), transport.clone());

        let snapshot = cache.check_connectivity().await;
        assert!(snapshot.configured);
        assert!(!snapshot.connected);
        assert_eq!(snapshot.status, HealthStatus::TimedOut);
        assert_eq!(transport.counters.opened.load(Ordering::SeqCst), 1);
        assert_eq!(transport.counters.closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_window() {
        let transport = ProbeTransport::new(Behavior::Pong);
        let cache = Arc::new(HealthProbeCache::new(&configured(), transport.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.check_connectivity().await })
            })
            .collect();

        let mut stamps = Vec::new();
        for task in tasks {
            stamps.push(task.await.unwrap().captured_at);
        }

        let opened = transport.counters.opened.load(Ordering::SeqCst);
        assert!(opened >= 1);
        assert_eq!(transport.counters.closed.load(Ordering::SeqCst), opened);

        // Once published, later callers see the authoritative snapshot.
        let after = cache.check_connectivity().await;
        assert_eq!(transport.counters.opened.load(Ordering::SeqCst), opened);
        assert!(stamps.contains(&after.captured_at));
    }
}
