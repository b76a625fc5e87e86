//! Seam to the text-generation runtime.
//!
//! The service never runs a forward pass in process. Models are bound to a
//! generation capability through [`EngineProvider`], and every call goes
//! through the [`TextGenerator`] trait, so backends can be swapped without
//! touching the serving path.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub mod worker;

pub use worker::{WorkerEngine, WorkerEngineProvider};

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub max_length: usize,
    pub num_return_sequences: usize,
    pub temperature: f32,
    pub do_sample: bool,
}

impl SamplingParams {
    /// Preset for single-shot inference requests.
    pub fn completion() -> Self {
        Self {
            max_length: 200,
            num_return_sequences: 1,
            temperature: 0.7,
            do_sample: false,
        }
    }

    /// Preset for chat turns.
    pub fn chat() -> Self {
        Self {
            max_length: 300,
            num_return_sequences: 1,
            temperature: 0.8,
            do_sample: true,
        }
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::completion()
    }
}

/// Compute device a model is bound to.
///
/// `Auto` defers the choice to the engine at bind time: accelerator if one
/// is available, general-purpose compute otherwise. The decision is made
/// once per model load, never per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Auto,
    Cuda,
    Cpu,
}

impl Device {
    /// Parse a configured device name. Unknown names fall back to `Cpu`.
    pub fn parse(name: &str) -> Self {
        match name {
            "auto" => Device::Auto,
            "cuda" => Device::Cuda,
            _ => Device::Cpu,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Auto => "auto",
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }
}

/// A bound generation capability: prompt in, candidate texts out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce candidate continuations for `prompt` under `params`.
    ///
    /// Returns `num_return_sequences` candidates; callers usually take the
    /// first. Candidates may include the echoed prompt.
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<Vec<String>>;
}

/// Binds model artifacts to a generation capability.
#[async_trait]
pub trait EngineProvider: Send + Sync {
    /// Bind the artifacts under `model_dir` on `device`.
    async fn bind(&self, model_dir: &Path, device: Device) -> Result<Arc<dyn TextGenerator>>;
}
