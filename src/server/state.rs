//! Server state management

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::models::{ModelCache, ModelLoader};

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    /// Cache of loaded models keyed by content hash, with LRU eviction
    pub model_cache: Arc<ModelCache>,

    /// Service configuration (from unified config system)
    pub config: Arc<ServiceConfig>,

    /// Metrics collector
    pub metrics: Arc<Metrics>,
}

/// Metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    /// Total requests processed
    pub total_requests: AtomicU64,

    /// Average latency in milliseconds
    pub avg_latency_ms: RwLock<f64>,

    /// Active requests
    pub active_requests: AtomicU32,
}

impl Metrics {
    /// Fold a request latency into the running average.
    pub async fn record_latency(&self, latency_ms: f64) {
        let mut avg = self.avg_latency_ms.write().await;
        if *avg == 0.0 {
            *avg = latency_ms;
        } else {
            *avg = (*avg * 0.9) + (latency_ms * 0.1);
        }
    }
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: ServiceConfig, loader: ModelLoader) -> Self {
        let model_cache = Arc::new(ModelCache::new(config.server.max_cached_models, loader));

        // Preload models for faster first request
        if !config.server.preload_models.is_empty() {
            info!("Preloading {} models", config.server.preload_models.len());
            for hash in &config.server.preload_models {
                match model_cache.get_or_load(hash).await {
                    Ok(_) => info!("Preloaded: {}", hash),
                    Err(e) => warn!("Failed to preload model '{}': {}", hash, e),
                }
            }
        }

        Self {
            model_cache,
            config: Arc::new(config),
            metrics: Arc::new(Metrics::default()),
        }
    }

    /// Upper bound for a single generation call
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.config.server.generation_timeout_secs)
    }

    /// Get server metrics
    pub async fn get_metrics(&self) -> serde_json::Value {
        let cache_stats = self.model_cache.stats().await;
        serde_json::json!({
            "total_requests": self.metrics.total_requests.load(Ordering::Relaxed),
            "active_requests": self.metrics.active_requests.load(Ordering::Relaxed),
            "avg_latency_ms": *self.metrics.avg_latency_ms.read().await,
            "cached_models": cache_stats.cached_models,
            "total_loads": cache_stats.total_loads,
        })
    }
}

/// Guard that keeps the active-request gauge accurate even when a
/// handler returns early.
pub struct MetricsGuard {
    metrics: Arc<Metrics>,
    completed: bool,
}

impl MetricsGuard {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        metrics.active_requests.fetch_add(1, Ordering::Relaxed);
        Self {
            metrics,
            completed: false,
        }
    }

    /// Mark the request as completed normally
    pub fn mark_completed(mut self) {
        self.completed = true;
        self.metrics.active_requests.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Drop for MetricsGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.metrics.active_requests.fetch_sub(1, Ordering::Relaxed);
        }
    }
}
