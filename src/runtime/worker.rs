//! HTTP client for an out-of-process generation worker.
//!
//! The worker owns tokenization, weight loading, and the forward pass. This
//! side binds a model once (`POST /bind`) and then issues one `POST
//! /generate` per call against the returned model token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{Device, EngineProvider, SamplingParams, TextGenerator};

/// Provider that binds models on a generation worker over HTTP.
pub struct WorkerEngineProvider {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct BindRequest<'a> {
    path: &'a str,
    device: Device,
}

#[derive(Deserialize)]
struct BindResponse {
    model: String,
    device: Device,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(flatten)]
    params: &'a SamplingParams,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<String>,
}

impl WorkerEngineProvider {
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("failed to build worker HTTP client")?;
        let endpoint = endpoint.into();
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EngineProvider for WorkerEngineProvider {
    async fn bind(&self, model_dir: &Path, device: Device) -> Result<Arc<dyn TextGenerator>> {
        let url = format!("{}/bind", self.endpoint);
        let path = model_dir.to_string_lossy();
        let request = BindRequest {
            path: &path,
            device,
        };

        let response: BindResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("generation worker unreachable at {}", url))?
            .error_for_status()
            .context("generation worker rejected bind")?
            .json()
            .await
            .context("invalid bind response from generation worker")?;

        // The worker resolves Auto to whatever it actually has.
        info!(
            "Bound model {} on worker (device: {})",
            response.model,
            response.device.as_str()
        );

        Ok(Arc::new(WorkerEngine {
            client: self.client.clone(),
            endpoint: self.endpoint.clone(),
            model: response.model,
        }))
    }
}

/// Generation capability backed by a bound worker model.
pub struct WorkerEngine {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[async_trait]
impl TextGenerator for WorkerEngine {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<Vec<String>> {
        let url = format!("{}/generate", self.endpoint);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            params,
        };

        let response: GenerateResponse = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("generation worker unreachable at {}", url))?
            .error_for_status()
            .context("generation worker rejected generate")?
            .json()
            .await
            .context("invalid generate response from generation worker")?;

        Ok(response.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let provider =
            WorkerEngineProvider::new("http://127.0.0.1:8601/", Duration::from_secs(1)).unwrap();
        assert_eq!(provider.endpoint, "http://127.0.0.1:8601");
    }

    #[test]
    fn generate_request_wire_shape() {
        let params = SamplingParams::chat();
        let request = GenerateRequest {
            model: "m-1",
            prompt: "hi",
            params: &params,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "m-1");
        assert_eq!(value["prompt"], "hi");
        assert_eq!(value["max_length"], 300);
        assert_eq!(value["do_sample"], true);
    }
}
