//! Content-addressed artifact store seam.
//!
//! Models arrive as immutable bundles named by a content hash. A bundle is a
//! directory containing `model_config.json` at its root and, for supported
//! kinds, a `model/` directory with the weight and tokenizer artifacts.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod gateway;
pub mod local;

pub use gateway::GatewayStore;
pub use local::LocalStore;

/// Configuration file at the root of every bundle.
pub const CONFIG_FILE: &str = "model_config.json";
/// Artifact directory for supported model kinds.
pub const MODEL_DIR: &str = "model";
/// The one model kind the engine seam can bind.
pub const TRANSFORMERS_KIND: &str = "transformers";

/// Errors from fetching or reading bundles.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bundle {0} not found in store")]
    NotFound(String),
    #[error("io error reading bundle: {0}")]
    Io(#[from] std::io::Error),
    #[error("gateway request failed: {0}")]
    Gateway(#[from] reqwest::Error),
    #[error("invalid bundle metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("bundle manifest lists unsafe path {0}")]
    UnsafePath(String),
}

/// Content hashes are opaque but must stay within one path segment.
pub(crate) fn valid_hash(hash: &str) -> bool {
    !hash.is_empty() && hash.chars().all(|c| c.is_ascii_alphanumeric())
}

/// A fetched artifact bundle, rooted at a local directory.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    root: PathBuf,
}

impl ArtifactBundle {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join(MODEL_DIR)
    }

    /// Read and parse the bundle's `model_config.json`.
    pub async fn read_config(&self) -> Result<ModelConfig, StoreError> {
        let raw = tokio::fs::read(self.root.join(CONFIG_FILE)).await?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

/// Parsed `model_config.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Declared model kind; bundles that omit it are transformers.
    #[serde(default = "default_model_type")]
    pub model_type: String,
}

fn default_model_type() -> String {
    TRANSFORMERS_KIND.to_string()
}

/// Fetch-by-hash capability of a content-addressed store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Resolve `hash` to a local bundle directory.
    async fn fetch(&self, hash: &str) -> Result<ArtifactBundle, StoreError>;
}
