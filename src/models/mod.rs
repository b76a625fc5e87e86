//! Resolved models: handles, loading, and the in-process cache.

use std::sync::Arc;

use crate::runtime::TextGenerator;

pub mod cache;
pub mod loader;

pub use cache::{CacheStats, ModelCache};
pub use loader::{LoadError, ModelLoader};

/// How a resolved model produces text.
pub enum GenerationBackend {
    /// Bound generation capability.
    Engine(Arc<dyn TextGenerator>),
    /// Declared kind is unsupported; calls fall back to fixed stub text.
    Stub,
}

/// A resolved model, immutable once constructed.
pub struct ModelHandle {
    hash: String,
    kind: String,
    backend: GenerationBackend,
}

impl ModelHandle {
    pub fn new(hash: String, kind: String, backend: GenerationBackend) -> Self {
        Self {
            hash,
            kind,
            backend,
        }
    }

    /// Content hash this handle was resolved from.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Model kind declared by the bundle config.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn backend(&self) -> &GenerationBackend {
        &self.backend
    }

    pub fn supports_generation(&self) -> bool {
        matches!(self.backend, GenerationBackend::Engine(_))
    }
}
