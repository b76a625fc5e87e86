//! Inference execution over resolved model handles.

pub mod context;

use anyhow::{anyhow, Result};

use crate::models::{GenerationBackend, ModelHandle};
use crate::runtime::SamplingParams;

/// Fallback reply for single-shot requests against stub-backed models.
pub const STUB_COMPLETION_REPLY: &str = "Inference completed";
/// Fallback reply for chat turns against stub-backed models.
pub const STUB_CHAT_REPLY: &str = "I received your message.";

/// Run one generation call against a handle.
///
/// Engine-backed handles return the first candidate verbatim, echoed prompt
/// included; stripping is the caller's concern. Stub-backed handles return
/// `fallback` unchanged.
pub async fn complete(
    handle: &ModelHandle,
    prompt: &str,
    params: &SamplingParams,
    fallback: &str,
) -> Result<String> {
    match handle.backend() {
        GenerationBackend::Engine(generator) => {
            let candidates = generator.generate(prompt, params).await?;
            candidates
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("engine returned no candidates"))
        }
        GenerationBackend::Stub => Ok(fallback.to_string()),
    }
}
