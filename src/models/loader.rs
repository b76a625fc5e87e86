//! Resolves content hashes into usable model handles.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::runtime::{Device, EngineProvider};
use crate::store::{ContentStore, StoreError, TRANSFORMERS_KIND};

use super::{GenerationBackend, ModelHandle};

/// Why a load failed. Callers surface every variant as "not found".
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to bind {hash} on engine: {source}")]
    Bind {
        hash: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Loader with its collaborators injected at construction.
pub struct ModelLoader {
    store: Arc<dyn ContentStore>,
    provider: Arc<dyn EngineProvider>,
    device: Device,
}

impl ModelLoader {
    pub fn new(
        store: Arc<dyn ContentStore>,
        provider: Arc<dyn EngineProvider>,
        device: Device,
    ) -> Self {
        Self {
            store,
            provider,
            device,
        }
    }

    /// Fetch, parse, and bind one model.
    ///
    /// Every failure is logged here and reported as a [`LoadError`]; nothing
    /// on this path panics. Unsupported kinds are not failures: they produce
    /// a stub-backed handle and never touch the engine provider.
    pub async fn load(&self, hash: &str) -> Result<ModelHandle, LoadError> {
        match self.try_load(hash).await {
            Ok(handle) => Ok(handle),
            Err(e) => {
                warn!("Failed to load model {}: {}", hash, e);
                Err(e)
            }
        }
    }

    async fn try_load(&self, hash: &str) -> Result<ModelHandle, LoadError> {
        let bundle = self.store.fetch(hash).await?;
        let config = bundle.read_config().await?;
        let kind = config.model_type;

        let backend = if kind == TRANSFORMERS_KIND {
            let generator = self
                .provider
                .bind(&bundle.model_dir(), self.device)
                .await
                .map_err(|source| LoadError::Bind {
                    hash: hash.to_string(),
                    source,
                })?;
            info!("Loaded model {} ({})", hash, kind);
            GenerationBackend::Engine(generator)
        } else {
            info!("Model {} declares kind '{}', serving stub output", hash, kind);
            GenerationBackend::Stub
        };

        Ok(ModelHandle::new(hash.to_string(), kind, backend))
    }
}
