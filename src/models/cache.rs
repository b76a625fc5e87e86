//! Hash-keyed model cache with single-flight loading.

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::loader::{LoadError, ModelLoader};
use super::ModelHandle;

/// Cache of resolved models keyed by content hash.
///
/// Hits return the resident handle unchanged, with no staleness check: a
/// content hash names an immutable bundle. Misses run the loader under a
/// per-hash guard, so concurrent misses for one hash perform a single load.
/// Failed loads leave the cache unpopulated and a later call retries.
/// Residency is bounded by LRU eviction; evicted handles stay alive for
/// requests that already hold them.
pub struct ModelCache {
    entries: Mutex<LruCache<String, Arc<ModelHandle>>>,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    loader: ModelLoader,
    max_size: usize,
    total_loads: AtomicU64,
}

impl ModelCache {
    pub fn new(max_size: usize, loader: ModelLoader) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::new(5).unwrap());
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            inflight: Mutex::new(HashMap::new()),
            loader,
            max_size: capacity.get(),
            total_loads: AtomicU64::new(0),
        }
    }

    /// Get the handle for `hash`, loading it on first use.
    pub async fn get_or_load(&self, hash: &str) -> Result<Arc<ModelHandle>, LoadError> {
        {
            let mut entries = self.entries.lock().await;
            if let Some(handle) = entries.get(hash) {
                info!("Model {} found in cache", hash);
                return Ok(Arc::clone(handle));
            }
        }

        // Per-hash gate: at most one load runs for a given hash. The gate
        // entry outlives failed and cancelled attempts, so queued waiters
        // and late callers keep serializing on it until a load succeeds.
        let gate = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(inflight.entry(hash.to_string()).or_default())
        };
        let _running = gate.lock().await;

        // A concurrent caller may have finished the load while we waited.
        {
            let mut entries = self.entries.lock().await;
            if let Some(handle) = entries.get(hash) {
                return Ok(Arc::clone(handle));
            }
        }

        info!("Model {} not in cache, loading", hash);
        self.total_loads.fetch_add(1, Ordering::Relaxed);
        let handle = Arc::new(self.loader.load(hash).await?);

        {
            let mut entries = self.entries.lock().await;
            if let Some((evicted, _)) = entries.push(hash.to_string(), Arc::clone(&handle)) {
                if evicted != hash {
                    warn!("Evicted model {} from cache", evicted);
                }
            }
        }

        // Order matters: the gate entry is dropped only after publication,
        // so a caller that misses it sees the handle on its double-check.
        {
            let mut inflight = self.inflight.lock().await;
            inflight.remove(hash);
        }
        Ok(handle)
    }

    /// Point-in-time counters.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        CacheStats {
            cached_models: entries.len(),
            max_size: self.max_size,
            total_loads: self.total_loads.load(Ordering::Relaxed),
        }
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.lock().await;
        entries.clear();
        info!("Model cache cleared");
    }

    /// Drop the entry for `hash` if resident.
    pub async fn invalidate(&self, hash: &str) {
        let mut entries = self.entries.lock().await;
        if entries.pop(hash).is_some() {
            info!("Invalidated model {} from cache", hash);
        }
    }

    pub async fn is_cached(&self, hash: &str) -> bool {
        let entries = self.entries.lock().await;
        entries.peek(hash).is_some()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub cached_models: usize,
    pub max_size: usize,
    pub total_loads: u64,
}
