//! Shared fakes for integration testing.

#![allow(dead_code)]

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ledger_bootstrap::cache::{CacheError, CacheSession, CacheTransport, ConnectOptions};
use ledger_bootstrap::environment::{ProbeFailure, ReachabilityProbe};
use ledger_bootstrap::BootstrapConfig;

/// Well-known development key and its address.
pub const TEST_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// A different, valid address.
pub const OTHER_ADDRESS: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(label: &str) -> PathBuf {
    static SEQ: AtomicUsize = AtomicUsize::new(0);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ledger-bootstrap-{}-{}-{}-{}",
        label,
        std::process::id(),
        SEQ.fetch_add(1, Ordering::SeqCst),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Development config whose on-disk state lives in `dir`.
pub fn dev_config(dir: &std::path::Path) -> BootstrapConfig {
    let mut config = BootstrapConfig::default();
    config.deployment.mode = "development".into();
    config.identity.dev_keyfile_path = dir.join("identity.json");
    config.state_cache.path = dir.join("state-cache.json");
    config.admin.enabled = false;
    config
}

/// Production config pointing at `keyfile` and expecting `address`.
pub fn production_config(dir: &std::path::Path, keyfile: PathBuf, address: &str) -> BootstrapConfig {
    let mut config = dev_config(dir);
    config.deployment.mode = "production".into();
    config.identity.keyfile_path = Some(keyfile);
    config.identity.expected_address = Some(address.into());
    config
}

/// Write a key file containing [`TEST_PRIVATE_KEY`].
pub fn write_test_keyfile(dir: &std::path::Path) -> PathBuf {
    let path = dir.join("prod-identity.json");
    let body = serde_json::json!({
        "private_key": TEST_PRIVATE_KEY,
        "address": TEST_ADDRESS,
    });
    std::fs::write(&path, serde_json::to_vec_pretty(&body).unwrap()).unwrap();
    path
}

/// Reachability probe with a fixed answer that counts invocations.
#[derive(Default)]
pub struct FixedProbe {
    pub reachable: bool,
    pub calls: AtomicUsize,
}

impl FixedProbe {
    pub fn reachable() -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReachabilityProbe for FixedProbe {
    fn probe(&self, host: &str, port: u16, _deadline: Duration) -> BoxFuture<'_, Result<(), ProbeFailure>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.reachable {
            Ok(())
        } else {
            Err(ProbeFailure::Unreachable {
                addr: format!("{}:{}", host, port),
                reason: "connection refused".into(),
            })
        };
        Box::pin(async move { result })
    }
}

/// In-memory cache server whose availability can be toggled.
#[derive(Default)]
pub struct FakeCacheServer {
    down: AtomicBool,
    data: Mutex<HashMap<String, String>>,
    pub managed_connects: AtomicUsize,
    pub probe_connects: AtomicUsize,
    pub commands: AtomicUsize,
}

impl FakeCacheServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.data.lock().unwrap().get(key).cloned()
    }

    pub fn probe_connects(&self) -> usize {
        self.probe_connects.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CacheError> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            Err(CacheError::Command("connection reset".into()))
        } else {
            Ok(())
        }
    }
}

/// Transport over a [`FakeCacheServer`].
#[derive(Clone)]
pub struct FakeTransport {
    pub server: Arc<FakeCacheServer>,
}

impl FakeTransport {
    pub fn new(server: Arc<FakeCacheServer>) -> Arc<Self> {
        Arc::new(Self { server })
    }
}

struct FakeSession {
    server: Arc<FakeCacheServer>,
}

impl CacheSession for FakeSession {
    fn ping(&self) -> BoxFuture<'_, Result<(), CacheError>> {
        Box::pin(async move { self.server.check() })
    }

    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, CacheError>> {
        Box::pin(async move {
            self.server.check()?;
            Ok(self.server.value(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), CacheError>> {
        Box::pin(async move {
            self.server.check()?;
            self.server
                .data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        })
    }
}

impl CacheTransport for FakeTransport {
    fn connect_managed(
        &self,
        _url: &str,
        _options: &ConnectOptions,
    ) -> BoxFuture<'_, Result<Arc<dyn CacheSession>, CacheError>> {
        self.server.managed_connects.fetch_add(1, Ordering::SeqCst);
        let server = self.server.clone();
        Box::pin(async move {
            if server.down.load(Ordering::SeqCst) {
                return Err(CacheError::Connect("connection refused".into()));
            }
            Ok(Arc::new(FakeSession { server }) as Arc<dyn CacheSession>)
        })
    }

    fn connect_probe(
        &self,
        _url: &str,
        _deadline: Duration,
    ) -> BoxFuture<'_, Result<Box<dyn CacheSession>, CacheError>> {
        self.server.probe_connects.fetch_add(1, Ordering::SeqCst);
        let server = self.server.clone();
        Box::pin(async move {
            if server.down.load(Ordering::SeqCst) {
                return Err(CacheError::Connect("connection refused".into()));
            }
            Ok(Box::new(FakeSession { server }) as Box<dyn CacheSession>)
        })
    }
}

/// Transport that fails the test if any connection is attempted.
pub struct ForbiddenTransport;

impl CacheTransport for ForbiddenTransport {
    fn connect_managed(
        &self,
        url: &str,
        _options: &ConnectOptions,
    ) -> BoxFuture<'_, Result<Arc<dyn CacheSession>, CacheError>> {
        panic!("unexpected managed connection to {}", url);
    }

    fn connect_probe(
        &self,
        url: &str,
        _deadline: Duration,
    ) -> BoxFuture<'_, Result<Box<dyn CacheSession>, CacheError>> {
        panic!("unexpected probe connection to {}", url);
    }
}
