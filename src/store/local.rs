//! Bundles laid out on local disk, one directory per content hash.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::{valid_hash, ArtifactBundle, ContentStore, StoreError};

/// Store rooted at a directory whose children are hash-named bundles.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    async fn fetch(&self, hash: &str) -> Result<ArtifactBundle, StoreError> {
        if !valid_hash(hash) {
            return Err(StoreError::NotFound(hash.to_string()));
        }

        let dir = self.root.join(hash);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {
                debug!("Resolved bundle {} at {:?}", hash, dir);
                Ok(ArtifactBundle::new(dir))
            }
            _ => Err(StoreError::NotFound(hash.to_string())),
        }
    }
}
