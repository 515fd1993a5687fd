//! Long-lived distributed cache connection.
//!
//! # States
//! - Connection: Disconnected → Connecting → Ready ⇄ Degraded
//! - Error logging gate: Quiet ⇄ Warned
//!
//! # State Transitions
//! ```text
//! Quiet  → Warned: first error since the last ready (one warning logged)
//! Warned → Warned: further errors (suppressed)
//! Warned → Quiet:  ready again (a future disconnection is reported again)
//! ```
//!
//! # Design Decisions
//! - `connect` never fails; every failure degrades to `None`
//! - Only the connection manager builds a long-lived connection
//! - A heartbeat keeps the state machine fed while the handle is alive

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};
use tokio::time::timeout;

use crate::cache::transport::{
    redacted, CacheError, CacheSession, CacheTransport, ConnectOptions, RedisTransport,
};
use crate::config::CacheConfig;
use crate::observability::metrics;

/// Connection status as seen by request-time code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Ready,
    Degraded,
}

/// Log-storm suppression state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogGate {
    Quiet,
    Warned,
}

/// Observable connection state.
#[derive(Debug, Clone, Serialize)]
pub struct CacheConnectionState {
    pub status: ConnectionStatus,
    pub last_error_logged_at: Option<SystemTime>,
}

/// Receives connection lifecycle events.
pub trait ConnectionNotifier: Send + Sync {
    fn on_ready(&self);
    fn on_error(&self, error: &CacheError);
}

#[derive(Debug)]
struct MonitorState {
    status: ConnectionStatus,
    gate: LogGate,
    last_error_logged_at: Option<SystemTime>,
    warnings: u64,
}

/// State machine behind the long-lived connection.
#[derive(Debug)]
pub struct ConnectionMonitor {
    state: Mutex<MonitorState>,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MonitorState {
                status: ConnectionStatus::Disconnected,
                gate: LogGate::Quiet,
                last_error_logged_at: None,
                warnings: 0,
            }),
        }
    }

    pub(crate) fn set_connecting(&self) {
        self.state.lock().status = ConnectionStatus::Connecting;
        metrics::record_cache_status(ConnectionStatus::Connecting);
    }

    pub fn state(&self) -> CacheConnectionState {
        let state = self.state.lock();
        CacheConnectionState {
            status: state.status,
            last_error_logged_at: state.last_error_logged_at,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    pub fn gate(&self) -> LogGate {
        self.state.lock().gate
    }

    /// Number of warnings logged so far (one per Quiet → Warned).
    pub fn warnings_emitted(&self) -> u64 {
        self.state.lock().warnings
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionNotifier for ConnectionMonitor {
    fn on_ready(&self) {
        let recovered = {
            let mut state = self.state.lock();
            let recovered = state.gate == LogGate::Warned;
            state.status = ConnectionStatus::Ready;
            state.gate = LogGate::Quiet;
            recovered
        };

        metrics::record_cache_status(ConnectionStatus::Ready);
        if recovered {
            tracing::info!("Distributed cache connection restored");
        } else {
            tracing::debug!("Distributed cache ready");
        }
    }

    fn on_error(&self, error: &CacheError) {
        let first = {
            let mut state = self.state.lock();
            state.status = ConnectionStatus::Degraded;
            if state.gate == LogGate::Quiet {
                state.gate = LogGate::Warned;
                state.last_error_logged_at = Some(SystemTime::now());
                state.warnings += 1;
                true
            } else {
                false
            }
        };

        metrics::record_cache_status(ConnectionStatus::Degraded);
        metrics::record_cache_error();
        if first {
            tracing::warn!(error = %error, "Distributed cache unavailable, continuing without it");
        } else {
            tracing::trace!(error = %error, "Distributed cache error suppressed");
        }
    }
}

struct HandleInner {
    session: Arc<dyn CacheSession>,
    monitor: Arc<ConnectionMonitor>,
    command_timeout: Duration,
}

/// Shared handle to the long-lived cache connection.
///
/// Cloning is cheap; all clones share one connection and one state machine.
#[derive(Clone)]
pub struct CacheHandle {
    inner: Arc<HandleInner>,
}

impl CacheHandle {
    fn new(session: Arc<dyn CacheSession>, monitor: Arc<ConnectionMonitor>, command_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                session,
                monitor,
                command_timeout,
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.inner.monitor.status() == ConnectionStatus::Ready
    }

    pub fn state(&self) -> CacheConnectionState {
        self.inner.monitor.state()
    }

    pub fn monitor(&self) -> &ConnectionMonitor {
        &self.inner.monitor
    }

    /// Liveness round-trip.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let result = self.bounded(self.inner.session.ping()).await;
        self.observe(&result);
        result
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let result = self.bounded(self.inner.session.get(key)).await;
        self.observe(&result);
        result
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let result = self.bounded(self.inner.session.set(key, value)).await;
        self.observe(&result);
        result
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        match timeout(self.inner.command_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::timeout(self.inner.command_timeout)),
        }
    }

    fn observe<T>(&self, result: &Result<T, CacheError>) {
        match result {
            Ok(_) if !self.is_ready() => self.inner.monitor.on_ready(),
            Ok(_) => {}
            Err(e) => self.inner.monitor.on_error(e),
        }
    }
}

impl std::fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandle")
            .field("status", &self.inner.monitor.status())
            .field("command_timeout", &self.inner.command_timeout)
            .finish()
    }
}

/// Owns the lifecycle of the single long-lived cache connection.
pub struct CacheConnectionManager {
    config: CacheConfig,
    transport: Arc<dyn CacheTransport>,
}

impl CacheConnectionManager {
    pub fn new(config: CacheConfig, transport: Arc<dyn CacheTransport>) -> Self {
        Self { config, transport }
    }

    pub fn with_redis(config: CacheConfig) -> Self {
        Self::new(config, Arc::new(RedisTransport))
    }

    /// Connect to the configured cache.
    ///
    /// Returns `None` when no address is configured or the connection or its
    /// first PING fails. Never returns an error.
    pub async fn connect(&self) -> Option<CacheHandle> {
        let Some(url) = self.config.url.as_deref() else {
            tracing::info!("No distributed cache configured");
            return None;
        };

        let options = ConnectOptions::from(&self.config);
        let monitor = Arc::new(ConnectionMonitor::new());
        monitor.set_connecting();

        tracing::info!(cache = %redacted(url), "Connecting to distributed cache");

        let session = match self.transport.connect_managed(url, &options).await {
            Ok(session) => session,
            Err(e) => {
                monitor.on_error(&e);
                return None;
            }
        };

        match timeout(options.response_timeout, session.ping()).await {
            Ok(Ok(())) => monitor.on_ready(),
            Ok(Err(e)) => {
                monitor.on_error(&e);
                return None;
            }
            Err(_) => {
                monitor.on_error(&CacheError::timeout(options.response_timeout));
                return None;
            }
        }

        let handle = CacheHandle::new(session, monitor, options.response_timeout);
        spawn_heartbeat(
            Arc::downgrade(&handle.inner),
            Duration::from_secs(self.config.heartbeat_interval_secs),
        );

        tracing::info!(cache = %redacted(url), "Distributed cache connected");
        Some(handle)
    }
}

/// Periodic liveness ping; ends once every handle is dropped.
fn spawn_heartbeat(inner: Weak<HandleInner>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(inner) = inner.upgrade() else {
                tracing::debug!("Cache heartbeat stopped");
                break;
            };
            let _ = CacheHandle { inner }.ping().await;
        }
    });
}
