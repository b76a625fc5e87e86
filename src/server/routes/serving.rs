//! Inference and chat endpoints

use std::sync::atomic::Ordering;
use std::time::Instant;

use axum::{extract::State, routing::post, Json, Router};
use tracing::{error, info};

use crate::api::{ChatRequest, ChatResponse, InferenceRequest, InferenceResponse};
use crate::error::ApiError;
use crate::inference::{self, context};
use crate::models::ModelHandle;
use crate::runtime::SamplingParams;
use crate::server::state::{AppState, MetricsGuard};
use crate::verify;

/// Create the serving router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/inference", post(run_inference))
        .route("/chat", post(chat))
}

/// Handle single-shot inference requests
async fn run_inference(
    State(state): State<AppState>,
    Json(request): Json<InferenceRequest>,
) -> Result<Json<InferenceResponse>, ApiError> {
    info!(
        "Inference request {} for model {} (id {})",
        request.inference_id, request.ipfs_hash, request.model_id
    );

    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
    let guard = MetricsGuard::new(state.metrics.clone());
    let start_time = Instant::now();

    let handle = resolve_model(&state, &request.ipfs_hash).await?;

    let output = generate(
        &state,
        &handle,
        &request.input_data,
        &SamplingParams::completion(),
        inference::STUB_COMPLETION_REPLY,
    )
    .await?;

    let verification_hash = verify::digest(request.inference_id, &request.input_data, &output);

    state
        .metrics
        .record_latency(start_time.elapsed().as_millis() as f64)
        .await;
    guard.mark_completed();

    Ok(Json(InferenceResponse {
        success: true,
        inference_id: request.inference_id,
        output,
        verification_hash,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Handle multi-turn chat requests
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    info!("Chat request for model {}", request.ipfs_hash);

    state.metrics.total_requests.fetch_add(1, Ordering::Relaxed);
    let guard = MetricsGuard::new(state.metrics.clone());
    let start_time = Instant::now();

    let handle = resolve_model(&state, &request.ipfs_hash).await?;

    let prompt = context::build_prompt(&request.chat_history, &request.message);
    let raw = generate(
        &state,
        &handle,
        &prompt,
        &SamplingParams::chat(),
        inference::STUB_CHAT_REPLY,
    )
    .await?;
    let response = context::strip_prompt(&raw, &prompt);

    state
        .metrics
        .record_latency(start_time.elapsed().as_millis() as f64)
        .await;
    guard.mark_completed();

    Ok(Json(ChatResponse {
        success: true,
        response,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Resolve a content hash to a loaded model, mapping any load failure
/// to a 404 so callers see a stable "not found" surface.
async fn resolve_model(
    state: &AppState,
    hash: &str,
) -> Result<std::sync::Arc<ModelHandle>, ApiError> {
    state.model_cache.get_or_load(hash).await.map_err(|e| {
        error!("Failed to load model '{}': {}", hash, e);
        ApiError::ModelNotFound
    })
}

/// Run generation against a resolved model with the configured timeout.
async fn generate(
    state: &AppState,
    handle: &ModelHandle,
    prompt: &str,
    params: &SamplingParams,
    stub_reply: &str,
) -> Result<String, ApiError> {
    match tokio::time::timeout(
        state.generation_timeout(),
        inference::complete(handle, prompt, params, stub_reply),
    )
    .await
    {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            error!("Generation failed: {}", e);
            Err(ApiError::Execution(format!("Generation failed: {}", e)))
        }
        Err(_) => {
            error!("Generation timed out after {:?}", state.generation_timeout());
            Err(ApiError::Execution("Generation timed out".to_string()))
        }
    }
}
