//! Tiered state materialization.
//!
//! Lookup order follows the execution target's [`CacheStrategy`]:
//! distributed cache → local persistent store → recompute from source.
//! Values found in a slower tier are written back to the faster ones.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::future::Future;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cache::connection::CacheHandle;
use crate::environment::{CacheStrategy, CacheTier};

/// On-disk cache of materialized state, one JSON file per process.
#[derive(Clone, Default)]
pub struct LocalStateStore {
    inner: Arc<DashMap<String, String>>,
    persistence_path: Option<PathBuf>,
    /// Serializes file rewrites from concurrent `put`s.
    write_lock: Arc<Mutex<()>>,
}

impl LocalStateStore {
    /// Create an empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Load from file if it exists.
    pub fn load_from_file(path: &Path) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let map: HashMap<String, String> = serde_json::from_reader(reader)?;
            for (k, v) in map {
                store.inner.insert(k, v);
            }
            tracing::info!(entries = store.inner.len(), path = %path.display(), "Loaded local state cache");
        }
        Ok(store)
    }

    /// Save to file. The previous file stays intact until the new one is
    /// fully written, then it is replaced by rename.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let _guard = self.write_lock.lock();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let map: HashMap<_, _> = self
                .inner
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();

            let staging = staging_path(path);
            let mut writer = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer(&mut writer, &map)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            drop(writer);
            fs::rename(&staging, path)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    /// Insert and write through to disk on the blocking pool. Disk failures
    /// are logged only.
    pub async fn put(&self, key: &str, value: &str) {
        self.inner.insert(key.to_string(), value.to_string());
        if self.persistence_path.is_none() {
            return;
        }

        let store = self.clone();
        match tokio::task::spawn_blocking(move || store.save_to_file()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "Failed to persist local state cache"),
            Err(e) => tracing::warn!(error = %e, "Local state cache writer task failed"),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// A value together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub value: String,
    pub tier: CacheTier,
}

/// Composes the tiers named by a [`CacheStrategy`].
#[derive(Clone)]
pub struct TieredStateCache {
    distributed: Option<CacheHandle>,
    local: LocalStateStore,
    key_prefix: String,
}

impl TieredStateCache {
    /// Build the tier stack. The distributed handle is ignored unless the
    /// strategy includes the distributed tier.
    pub fn new(
        strategy: &CacheStrategy,
        distributed: Option<CacheHandle>,
        local: LocalStateStore,
        key_prefix: impl Into<String>,
    ) -> Self {
        let distributed = distributed.filter(|_| strategy.tiers().contains(&CacheTier::Distributed));
        Self {
            distributed,
            local,
            key_prefix: key_prefix.into(),
        }
    }

    pub fn local(&self) -> &LocalStateStore {
        &self.local
    }

    pub fn has_distributed_tier(&self) -> bool {
        self.distributed.is_some()
    }

    /// Read `key` from the fastest tier holding it, computing it otherwise.
    ///
    /// Distributed-tier errors fall through to the next tier; only `compute`
    /// errors are returned.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<Materialized, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let remote_key = format!("{}{}", self.key_prefix, key);

        if let Some(cache) = &self.distributed {
            match cache.get(&remote_key).await {
                Ok(Some(value)) => {
                    return Ok(Materialized {
                        value,
                        tier: CacheTier::Distributed,
                    })
                }
                Ok(None) => {}
                Err(e) => tracing::debug!(key = %key, error = %e, "Distributed tier read failed"),
            }
        }

        if let Some(value) = self.local.get(key) {
            self.write_distributed(&remote_key, &value).await;
            return Ok(Materialized {
                value,
                tier: CacheTier::LocalPersistent,
            });
        }

        let value = compute().await?;
        self.local.put(key, &value).await;
        self.write_distributed(&remote_key, &value).await;

        Ok(Materialized {
            value,
            tier: CacheTier::Recompute,
        })
    }

    async fn write_distributed(&self, remote_key: &str, value: &str) {
        if let Some(cache) = &self.distributed {
            if let Err(e) = cache.set(remote_key, value).await {
                tracing::debug!(key = %remote_key, error = %e, "Distributed tier write failed");
            }
        }
    }
}

impl std::fmt::Debug for TieredStateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredStateCache")
            .field("distributed", &self.distributed.is_some())
            .field("local_entries", &self.local.len())
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ledger_state_{}_{}.json", std::process::id(), name))
    }

    #[tokio::test]
    async fn test_recompute_then_local_hit() {
        let cache = TieredStateCache::new(
            &CacheStrategy::new(false),
            None,
            LocalStateStore::new(None),
            "state:",
        );

        let computed = AtomicUsize::new(0);
        let counter = &computed;
        let compute = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>("{\"v\":1}".to_string())
        };

        let first = cache.get_or_compute("contract-1", compute).await.unwrap();
        assert_eq!(first.tier, CacheTier::Recompute);

        let second = cache.get_or_compute("contract-1", compute).await.unwrap();
        assert_eq!(second.tier, CacheTier::LocalPersistent);
        assert_eq!(second.value, "{\"v\":1}");
        assert_eq!(computed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compute_error_propagates() {
        let cache = TieredStateCache::new(
            &CacheStrategy::new(false),
            None,
            LocalStateStore::new(None),
            "state:",
        );
        let result = cache
            .get_or_compute("broken", || async { Err::<String, _>("source unavailable") })
            .await;
        assert_eq!(result.unwrap_err(), "source unavailable");
        assert!(cache.local().is_empty());
    }

    #[tokio::test]
    async fn test_local_store_persistence() {
        let path = temp_file("persist");
        let store = LocalStateStore::new(Some(path.clone()));
        store.put("k", "v").await;

        let loaded = LocalStateStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.get("k").as_deref(), Some("v"));
        assert!(!staging_path(&path).exists());

        std::fs::remove_file(&path).unwrap_or_default();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_failed_rewrite_keeps_previous_file() {
        let path = temp_file("interrupted");
        let store = LocalStateStore::new(Some(path.clone()));
        store.put("a", "1").await;

        // Block the staging file so the next rewrite cannot complete
        let staging = staging_path(&path);
        std::fs::create_dir_all(&staging).unwrap();
        store.put("b", "2").await;
        assert_eq!(store.get("b").as_deref(), Some("2"));

        let loaded = LocalStateStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.get("a").as_deref(), Some("1"));
        assert_eq!(loaded.get("b"), None);

        std::fs::remove_dir_all(&staging).unwrap_or_default();
        std::fs::remove_file(&path).unwrap_or_default();
    }
}
